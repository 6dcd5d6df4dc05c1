use greenlord_core::eligibility::{GrantEligibilityMatch, GrantEligibilityResult};
use std::fmt::Write;

pub fn print(result: &GrantEligibilityResult, verbose: bool) {
    print!("{}", format(result, verbose));
}

/// Render a result as plain text for the terminal.
pub fn format(result: &GrantEligibilityResult, verbose: bool) -> String {
    let mut out = String::new();

    let location = match (&result.local_authority, result.region) {
        (Some(la), _) => format!(" ({}, {})", la.name, la.region),
        (None, Some(region)) => format!(" ({region}, local authority not recognised)"),
        (None, None) => " (location not recognised)".to_string(),
    };
    let _ = writeln!(out, "Postcode: {}{}", result.inputs.postcode, location);
    let _ = writeln!(
        out,
        "Evaluated {} against catalog v{}\n",
        result.as_of, result.catalog_version
    );
    let _ = writeln!(out, "{}\n", result.summary_message);

    if !result.eligible_grants.is_empty() {
        let _ = writeln!(out, "=== Eligible schemes ===\n");
        let width = name_width(&result.eligible_grants);
        for m in &result.eligible_grants {
            let _ = writeln!(
                out,
                "  {:<width$}  {:<17}  up to {}",
                m.scheme.name,
                m.confidence.label(),
                m.potential_value,
            );
            if m.requires_contribution {
                match m.estimated_contribution {
                    Some(amount) => {
                        let _ = writeln!(out, "    Landlord contribution: about {amount}");
                    }
                    None => {
                        let _ = writeln!(out, "    Landlord contribution required");
                    }
                }
            }
            for note in &m.ineligibility_reasons {
                let _ = writeln!(out, "    ? {note}");
            }
            if verbose {
                for reason in &m.eligibility_reasons {
                    let _ = writeln!(out, "    + {reason}");
                }
                for step in &m.next_steps {
                    let _ = writeln!(out, "    - {step}");
                }
            }
        }
        out.push('\n');
        let _ = writeln!(out, "  Total potential value: {}", result.total_potential_value);
        if result.claimable_value < result.total_potential_value {
            let _ = writeln!(out, "  Claimable together:    {}", result.claimable_value);
        }
        out.push('\n');
    }

    if !result.ineligible_grants.is_empty() {
        let _ = writeln!(out, "=== Not eligible ===\n");
        let width = name_width(&result.ineligible_grants);
        for m in &result.ineligible_grants {
            let reason = m
                .ineligibility_reasons
                .first()
                .map(String::as_str)
                .unwrap_or("criteria not met");
            let _ = writeln!(out, "  {:<width$}  {}", m.scheme.name, reason);
            if verbose {
                for passed in &m.eligibility_reasons {
                    let _ = writeln!(out, "    + {passed}");
                }
            }
        }
        out.push('\n');
    }

    if !result.next_steps.is_empty() {
        let _ = writeln!(out, "Next steps:");
        for (i, step) in result.next_steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, step);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", result.disclaimer);
    out
}

fn name_width(matches: &[GrantEligibilityMatch]) -> usize {
    matches
        .iter()
        .map(|m| m.scheme.name.len())
        .max()
        .unwrap_or(20)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use greenlord_core::model::{
        CurrentEpcRating, EpcRating, GrantEligibilityInputs, HeatingSystem, PropertyType,
        TenantBenefitStatus, TenantIncomeStatus, Tenure,
    };
    use greenlord_core::GrantEngine;

    fn result(postcode: &str) -> GrantEligibilityResult {
        let inputs = GrantEligibilityInputs {
            postcode: postcode.into(),
            property_type: PropertyType::TerracedHouse,
            tenure: Tenure::Freehold,
            heating_system: HeatingSystem::GasBoiler,
            current_epc_rating: CurrentEpcRating::Rated(EpcRating::E),
            tenant_benefit_status: TenantBenefitStatus::Yes,
            tenant_income_status: TenantIncomeStatus::BelowThreshold,
        };
        GrantEngine::builtin()
            .unwrap()
            .evaluate_as_of(&inputs, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .unwrap()
    }

    #[test]
    fn table_lists_both_sections() {
        let text = format(&result("M1 4BT"), false);
        assert!(text.starts_with("Postcode: M1 4BT (Manchester City Council, North West)"));
        assert!(text.contains("=== Eligible schemes ==="));
        assert!(text.contains("=== Not eligible ==="));
        assert!(text.contains("Landlord contribution: about £3,333.33"));
        assert!(text.contains("Claimable together:"));
        assert!(text.contains("Next steps:\n  1. "));
    }

    #[test]
    fn verbose_adds_reasons_and_steps() {
        let text = format(&result("M1 4BT"), true);
        assert!(text.contains("    + Property type eligible"));
        assert!(text.contains("    - Apply via "));
    }

    #[test]
    fn unrecognised_location_is_reported() {
        let text = format(&result("ZZ9 9ZZ"), false);
        assert!(text.starts_with("Postcode: ZZ9 9ZZ (location not recognised)"));
    }
}
