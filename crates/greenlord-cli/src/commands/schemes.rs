use chrono::NaiveDate;
use greenlord_core::catalog::schema::{Allowed, BenefitRequirement, ContributionFormula, GrantScheme};
use greenlord_core::catalog::{self, SchemeCatalog};
use greenlord_core::error::GrantError;
use greenlord_core::postcode::{AuthorityLookup, StaticPostcodeResolver};
use std::fmt::Display;
use std::path::Path;

use crate::config::CliConfig;

pub fn list(config: &CliConfig, as_of: NaiveDate) -> Result<(), GrantError> {
    let engine = super::engine(config)?;
    let catalog = engine.catalog();

    println!(
        "Scheme catalog v{} ({} schemes, status as of {}):\n",
        catalog.version(),
        catalog.len(),
        as_of
    );

    let width = catalog
        .schemes()
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(20);

    for scheme in catalog.schemes() {
        let status = if scheme.is_open_on(as_of) {
            "open"
        } else {
            "closed"
        };
        let reach = if scheme.is_local() { "local" } else { "national" };
        println!(
            "  {:<width$}  {:>9}  {:<6}  {:<8}  {}",
            scheme.id,
            scheme.max_grant_value.to_string(),
            status,
            reach,
            scheme.name,
        );
    }
    Ok(())
}

pub fn explain(config: &CliConfig, id: &str) -> Result<(), GrantError> {
    let engine = super::engine(config)?;
    let scheme = engine
        .catalog()
        .get(id)
        .ok_or_else(|| GrantError::UnknownScheme(id.to_string()))?;
    let rules = &scheme.eligibility;

    println!("{} ({})\n", scheme.name, scheme.id);
    println!("{}\n", scheme.description);
    if !scheme.detailed_description.is_empty() {
        println!("{}\n", scheme.detailed_description);
    }

    println!(
        "  Administered by:   {} ({})",
        scheme.administrator_name, scheme.administrator
    );
    match scheme.min_grant_value {
        Some(min) => println!("  Grant value:       {} to {}", min, scheme.max_grant_value),
        None => println!("  Grant value:       up to {}", scheme.max_grant_value),
    }
    println!("  Contribution:      {}", describe_contribution(scheme));
    match scheme.end_date {
        Some(end) => println!("  Open:              {} to {}", scheme.start_date, end),
        None => println!("  Open:              from {}", scheme.start_date),
    }
    if !scheme.is_active {
        println!("  Status:            withdrawn");
    }
    println!();

    println!("Eligibility:\n");
    println!("  Property types:    {}", describe_allowed(&rules.property_types));
    println!("  Tenure:            {}", describe_allowed(&rules.tenures));
    println!("  EPC rating:        {}", rules.epc.describe());
    let mut heating = describe_allowed(&rules.heating.allowed);
    if !rules.heating.forbidden.is_empty() {
        heating.push_str(&format!(" (excluding {})", join(&rules.heating.forbidden)));
    }
    println!("  Heating system:    {heating}");
    println!("  Area:              {}", rules.coverage.label());
    if let Some(ids) = &rules.local_authority_ids {
        let names: Vec<&str> = ids
            .iter()
            .map(|id| {
                engine
                    .lookup()
                    .authority_by_id(id)
                    .map(|la| la.name.as_str())
                    .unwrap_or(id.as_str())
            })
            .collect();
        println!("  Local authorities: {}", names.join(", "));
    }
    let benefits = match rules.tenant_benefits {
        BenefitRequirement::Required => "required",
        BenefitRequirement::NotRequired => "not required",
        BenefitRequirement::HelpsButOptional => "qualify the tenant regardless of income",
    };
    println!("  Tenant benefits:   {benefits}");
    if let Some(threshold) = rules.income_threshold {
        println!("  Household income:  below {threshold}");
    }
    if !rules.allows_rental_properties {
        println!("  Rental properties: not eligible");
    }
    println!();

    if !rules.additional_notes.is_empty() {
        println!("Notes:\n");
        for note in &rules.additional_notes {
            println!("  - {note}");
        }
        println!();
    }

    if !scheme.application_steps.is_empty() {
        println!("How to apply:\n");
        for (i, step) in scheme.application_steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        println!();
    }
    println!("Apply at {}", scheme.application_url);
    println!(
        "Details last verified {} ({})",
        scheme.last_verified, scheme.data_source
    );

    Ok(())
}

pub fn validate(file: &Path) -> Result<(), GrantError> {
    let catalog = catalog::load_catalog(file)?;
    let resolver = StaticPostcodeResolver::builtin()?;
    catalog.check_authorities(&resolver)?;

    let national = catalog.national().len();
    println!(
        "Catalog v{} is valid.",
        catalog.version()
    );
    println!(
        "  Schemes: {} ({} national, {} local)",
        catalog.len(),
        national,
        catalog.len() - national
    );

    let warnings = catalog_warnings(&catalog);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

pub fn stale(config: &CliConfig, today: NaiveDate) -> Result<(), GrantError> {
    let engine = super::engine(config)?;
    let stale = engine.catalog().needing_refresh(today);

    if stale.is_empty() {
        println!("All scheme details are up to date as of {today}.");
        return Ok(());
    }

    println!("{} scheme(s) due for re-verification as of {today}:\n", stale.len());
    for scheme in stale {
        println!(
            "  {:<34}  last verified {} ({} days ago)",
            scheme.id,
            scheme.last_verified,
            (today - scheme.last_verified).num_days()
        );
    }
    Ok(())
}

/// Problems worth flagging that do not make a catalog invalid.
fn catalog_warnings(catalog: &SchemeCatalog) -> Vec<String> {
    let mut warnings = Vec::new();
    for scheme in catalog.schemes() {
        if scheme.requires_contribution && scheme.contribution.is_none() {
            warnings.push(format!(
                "scheme '{}' requires a contribution but has no formula; estimates will be omitted",
                scheme.id
            ));
        }
        if scheme.coverage_categories.is_empty() {
            warnings.push(format!(
                "scheme '{}' lists no improvement categories",
                scheme.id
            ));
        }
        if !scheme.is_active {
            warnings.push(format!(
                "scheme '{}' is inactive and will never match",
                scheme.id
            ));
        }
    }
    warnings
}

fn describe_contribution(scheme: &GrantScheme) -> String {
    if !scheme.requires_contribution {
        return "none".to_string();
    }
    match &scheme.contribution {
        ContributionFormula::None => "required (amount not published)".to_string(),
        ContributionFormula::ShareOfCost { percent } => {
            match scheme.contribution.estimate(scheme.max_grant_value) {
                Some(estimate) => format!(
                    "{percent}% of total cost (about {estimate} at the maximum grant)"
                ),
                None => format!("{percent}% of total cost"),
            }
        }
        ContributionFormula::Fixed { amount } => format!("{amount}"),
    }
}

fn describe_allowed<T: Display>(allowed: &Allowed<T>) -> String {
    match allowed {
        Allowed::Any => "any".to_string(),
        Allowed::Only(values) => join(values),
    }
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
