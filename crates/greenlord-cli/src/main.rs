mod commands;
mod config;
mod output;
mod telemetry;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use config::CliConfig;
use greenlord_core::inputs::InputForm;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "greenlord",
    version,
    about = "Grant eligibility checker for landlord energy efficiency improvements"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check which grant schemes a rental property may qualify for
    Check {
        #[command(flatten)]
        form: FormArgs,

        /// Read the answers from a JSON file instead of flags
        #[arg(short, long, value_name = "FILE", conflicts_with_all = [
            "postcode", "property_type", "tenure", "heating", "epc", "benefits", "income"
        ])]
        input: Option<PathBuf>,

        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Show reasons for every scheme, including ineligible ones
        #[arg(long)]
        verbose: bool,
    },
    /// Inspect the scheme catalog
    Schemes {
        #[command(subcommand)]
        action: SchemesAction,
    },
    /// Show the local authority and region for a postcode
    Postcode {
        /// UK postcode, e.g. "M1 4BT"
        postcode: String,
    },
}

#[derive(Subcommand)]
enum SchemesAction {
    /// List all schemes with their open status
    List {
        /// Status as of this date (YYYY-MM-DD) instead of today
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,
    },
    /// Explain one scheme's eligibility rules in plain language
    Explain {
        /// Scheme id (e.g., "eco4")
        id: String,
    },
    /// Validate a scheme catalog file
    Validate {
        /// Path to JSON catalog file
        file: PathBuf,
    },
    /// List schemes whose data is due for re-verification
    Stale {
        /// Check as of this date (YYYY-MM-DD) instead of today
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,
    },
}

/// The grant checker form, one flag per question.
#[derive(Args)]
struct FormArgs {
    /// Property postcode
    #[arg(long)]
    postcode: Option<String>,

    /// detached-house, semi-detached-house, terraced-house, bungalow, flat, maisonette or hmo
    #[arg(long = "property-type")]
    property_type: Option<String>,

    /// freehold or leasehold
    #[arg(long)]
    tenure: Option<String>,

    /// gas-boiler, oil-boiler, lpg, electric, heat-pump or other
    #[arg(long)]
    heating: Option<String>,

    /// Current EPC rating (A-G) or unknown
    #[arg(long)]
    epc: Option<String>,

    /// Whether the tenant receives qualifying benefits: yes, no or unknown
    #[arg(long)]
    benefits: Option<String>,

    /// Tenant household income: below-threshold, above-threshold or unknown
    #[arg(long)]
    income: Option<String>,
}

impl FormArgs {
    fn into_form(self) -> InputForm {
        InputForm {
            postcode: self.postcode,
            property_type: self.property_type,
            tenure: self.tenure,
            heating_system: self.heating,
            current_epc_rating: self.epc,
            tenant_benefit_status: self.benefits,
            tenant_income_status: self.income,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = telemetry::init(&config.log_level) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Check {
            form,
            input,
            as_of,
            output,
            verbose,
        } => commands::check::run(
            form.into_form(),
            input,
            config.evaluation_date(as_of),
            &output,
            verbose,
            &config,
        ),
        Commands::Schemes { action } => match action {
            SchemesAction::List { as_of } => {
                commands::schemes::list(&config, config.evaluation_date(as_of))
            }
            SchemesAction::Explain { id } => commands::schemes::explain(&config, &id),
            SchemesAction::Validate { file } => commands::schemes::validate(&file),
            SchemesAction::Stale { as_of } => {
                commands::schemes::stale(&config, config.evaluation_date(as_of))
            }
        },
        Commands::Postcode { postcode } => commands::postcode::run(&config, &postcode),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_map_onto_form_fields() {
        let cli = Cli::try_parse_from([
            "greenlord",
            "check",
            "--postcode",
            "M1 4BT",
            "--property-type",
            "terraced-house",
            "--tenure",
            "freehold",
            "--heating",
            "gas-boiler",
            "--epc",
            "E",
            "--benefits",
            "yes",
            "--income",
            "unknown",
            "--as-of",
            "2026-06-01",
        ])
        .unwrap();

        let Commands::Check { form, as_of, .. } = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(as_of, NaiveDate::from_ymd_opt(2026, 6, 1));
        let inputs = form.into_form().validate().unwrap();
        assert_eq!(inputs.postcode, "M1 4BT");
    }

    #[test]
    fn input_file_conflicts_with_flags() {
        let parsed = Cli::try_parse_from([
            "greenlord",
            "check",
            "--input",
            "answers.json",
            "--postcode",
            "M1 4BT",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn schemes_subcommands_parse() {
        assert!(Cli::try_parse_from(["greenlord", "schemes", "explain", "eco4"]).is_ok());
        assert!(Cli::try_parse_from(["greenlord", "schemes", "stale", "--as-of", "2026-02-05"]).is_ok());
        assert!(Cli::try_parse_from(["greenlord", "schemes", "list", "--as-of", "soon"]).is_err());
    }
}
