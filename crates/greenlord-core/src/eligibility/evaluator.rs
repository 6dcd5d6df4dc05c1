use crate::catalog::schema::{BenefitRequirement, Coverage, GrantScheme};
use crate::eligibility::outcome::{Confidence, Criterion, GrantEligibilityMatch};
use crate::model::{
    GrantEligibilityInputs, Money, Postcode, TenantBenefitStatus, TenantIncomeStatus,
};
use crate::postcode::{AuthorityLookup, LocalAuthority, Region};
use chrono::NaiveDate;
use tracing::debug;

/// Where the property is, as far as the postcode tables can tell.
#[derive(Debug, Clone)]
pub struct PropertyLocation<'a> {
    pub postcode: Postcode,
    pub region: Option<Region>,
    pub local_authority: Option<&'a LocalAuthority>,
}

impl<'a> PropertyLocation<'a> {
    pub fn resolve(postcode: Postcode, lookup: &'a dyn AuthorityLookup) -> Self {
        let local_authority = lookup.local_authority(&postcode);
        // The authority's own region wins over the area table.
        let region = local_authority
            .map(|la| la.region)
            .or_else(|| lookup.region(&postcode));
        Self {
            postcode,
            region,
            local_authority,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.local_authority.is_some()
    }
}

/// Everything one evaluation pass shares across schemes.
pub struct EvaluationContext<'a> {
    pub inputs: &'a GrantEligibilityInputs,
    pub location: &'a PropertyLocation<'a>,
    pub lookup: &'a dyn AuthorityLookup,
    pub as_of: NaiveDate,
}

/// Outcome of a single check.
enum Check {
    Satisfied(String),
    Unknown(String),
    Failed(String),
}

/// Accumulates check outcomes for one scheme.
struct Tally {
    eligibility_reasons: Vec<String>,
    advisories: Vec<String>,
    unresolved: Vec<Criterion>,
    soft_total: usize,
}

impl Tally {
    fn new() -> Self {
        Self {
            eligibility_reasons: Vec::new(),
            advisories: Vec::new(),
            unresolved: Vec::new(),
            soft_total: 0,
        }
    }

    /// Record a check; returns the failure reason if it disqualifies.
    fn record(&mut self, criterion: Criterion, check: Check) -> Result<(), (Criterion, String)> {
        match check {
            Check::Satisfied(reason) => {
                self.eligibility_reasons.push(reason);
                Ok(())
            }
            Check::Unknown(reason) => {
                self.soft_total += 1;
                self.advisories.push(reason);
                self.unresolved.push(criterion);
                Ok(())
            }
            Check::Failed(reason) => Err((criterion, reason)),
        }
    }

    /// Record an applicable soft check that was answered.
    fn record_soft(
        &mut self,
        criterion: Criterion,
        check: Check,
    ) -> Result<(), (Criterion, String)> {
        if matches!(check, Check::Satisfied(_)) {
            self.soft_total += 1;
        }
        self.record(criterion, check)
    }
}

/// Map unresolved soft criteria to a confidence tier.
///
/// `unknown` of `total` applicable soft criteria are unresolved. A single
/// unresolved criterion on its own never counts as `likely`.
pub fn resolve_confidence(total: usize, unknown: usize) -> Confidence {
    if unknown == 0 {
        Confidence::Definite
    } else if total == 1 {
        Confidence::Possible
    } else if 2 * unknown < total {
        Confidence::Likely
    } else {
        Confidence::Possible
    }
}

/// Classify one scheme against the inputs.
pub fn evaluate_scheme(
    scheme: &GrantScheme,
    ctx: &EvaluationContext<'_>,
) -> GrantEligibilityMatch {
    let mut tally = Tally::new();

    match run_checks(scheme, ctx, &mut tally) {
        Ok(()) => {
            let confidence = resolve_confidence(tally.soft_total, tally.unresolved.len());
            debug!(
                scheme = %scheme.id,
                %confidence,
                unresolved = tally.unresolved.len(),
                "scheme matched"
            );
            let estimated_contribution = if scheme.requires_contribution {
                scheme.contribution.estimate(scheme.max_grant_value)
            } else {
                None
            };
            let next_steps = next_steps(scheme, &tally.unresolved);
            GrantEligibilityMatch {
                scheme: scheme.clone(),
                confidence,
                potential_value: scheme.max_grant_value,
                requires_contribution: scheme.requires_contribution,
                estimated_contribution,
                eligibility_reasons: tally.eligibility_reasons,
                ineligibility_reasons: tally.advisories,
                next_steps,
                unresolved_criteria: tally.unresolved,
                failed_criterion: None,
            }
        }
        Err((criterion, reason)) => {
            debug!(scheme = %scheme.id, ?criterion, %reason, "scheme ruled out");
            GrantEligibilityMatch {
                scheme: scheme.clone(),
                confidence: Confidence::Ineligible,
                potential_value: Money::ZERO,
                requires_contribution: scheme.requires_contribution,
                estimated_contribution: None,
                eligibility_reasons: tally.eligibility_reasons,
                ineligibility_reasons: vec![reason],
                next_steps: Vec::new(),
                unresolved_criteria: Vec::new(),
                failed_criterion: Some(criterion),
            }
        }
    }
}

/// Hard checks first, then soft ones; stops at the first failure.
fn run_checks(
    scheme: &GrantScheme,
    ctx: &EvaluationContext<'_>,
    tally: &mut Tally,
) -> Result<(), (Criterion, String)> {
    let rules = &scheme.eligibility;
    let inputs = ctx.inputs;

    // A closed scheme is reported as closed whatever else is true.
    tally.record(
        Criterion::OpenWindow,
        if scheme.is_open_on(ctx.as_of) {
            Check::Satisfied("Scheme open for applications".to_string())
        } else {
            Check::Failed("Scheme not currently open".to_string())
        },
    )?;

    tally.record(
        Criterion::PropertyType,
        if rules.property_types.permits(&inputs.property_type) {
            Check::Satisfied("Property type eligible".to_string())
        } else {
            Check::Failed(format!(
                "Property type ({}) not eligible",
                inputs.property_type
            ))
        },
    )?;

    tally.record(
        Criterion::Tenure,
        if rules.tenures.permits(&inputs.tenure) {
            Check::Satisfied("Tenure type eligible".to_string())
        } else {
            Check::Failed(format!("Tenure type ({}) not eligible", inputs.tenure))
        },
    )?;

    tally.record(
        Criterion::RentalProperty,
        if rules.allows_rental_properties {
            Check::Satisfied("Rental properties eligible".to_string())
        } else {
            Check::Failed("Scheme only available for owner-occupied properties".to_string())
        },
    )?;

    tally.record(Criterion::EpcRating, check_epc(scheme, inputs))?;
    tally.record(Criterion::HeatingSystem, check_heating(scheme, inputs))?;
    tally.record(Criterion::Location, check_location(scheme, ctx))?;

    if rules.tenant_benefits == BenefitRequirement::Required {
        tally.record_soft(Criterion::TenantBenefits, check_benefits(inputs))?;
    }

    if let Some(threshold) = rules.income_threshold {
        tally.record_soft(
            Criterion::TenantIncome,
            check_income(threshold, rules.tenant_benefits, inputs),
        )?;
    }

    Ok(())
}

fn check_epc(scheme: &GrantScheme, inputs: &GrantEligibilityInputs) -> Check {
    let requirement = &scheme.eligibility.epc;
    match inputs.current_epc_rating.rating() {
        _ if !requirement.is_restricted() => {
            Check::Satisfied("EPC rating meets scheme requirements".to_string())
        }
        None => Check::Unknown(
            "EPC rating unknown - eligibility depends on actual rating".to_string(),
        ),
        Some(rating) if requirement.permits(rating) => {
            Check::Satisfied("EPC rating meets scheme requirements".to_string())
        }
        Some(rating) => Check::Failed(format!(
            "Property EPC rating {} does not meet requirement (needs {})",
            rating,
            requirement.describe()
        )),
    }
}

fn check_heating(scheme: &GrantScheme, inputs: &GrantEligibilityInputs) -> Check {
    let rule = &scheme.eligibility.heating;
    let system = inputs.heating_system;
    if rule.forbidden.contains(&system) {
        return Check::Failed(format!(
            "Heating system type ({system}) is not eligible for this scheme"
        ));
    }
    if !rule.allowed.permits(&system) {
        return Check::Failed(format!(
            "Current heating system ({system}) does not meet scheme requirements"
        ));
    }
    Check::Satisfied("Heating system eligible for improvements".to_string())
}

fn check_location(scheme: &GrantScheme, ctx: &EvaluationContext<'_>) -> Check {
    let rules = &scheme.eligibility;
    let location = ctx.location;
    let mut unresolved = false;

    match location.region {
        Some(region) if !rules.coverage.covers(region) => {
            return Check::Failed(format!(
                "Scheme not available in your area ({}; scheme covers {})",
                region,
                rules.coverage.label()
            ));
        }
        Some(_) => {}
        None => unresolved |= rules.coverage != Coverage::UkWide,
    }

    if let Some(ids) = &rules.local_authority_ids {
        match location.local_authority {
            Some(la) if ids.iter().any(|id| *id == la.id) => {}
            Some(la) => {
                return Check::Failed(format!(
                    "Scheme not available in your area ({} is not covered)",
                    la.name
                ));
            }
            None => {
                // Rule out schemes whose councils are all in other regions.
                if let Some(region) = location.region {
                    let could_match = ids.iter().any(|id| {
                        ctx.lookup
                            .authority_by_id(id)
                            .is_none_or(|la| la.region == region)
                    });
                    if !could_match {
                        return Check::Failed(format!(
                            "Scheme not available in your area ({region})"
                        ));
                    }
                }
                unresolved = true;
            }
        }
    }

    if unresolved {
        Check::Unknown(format!(
            "Local authority for {} could not be confirmed - eligibility depends on property location",
            location.postcode
        ))
    } else {
        Check::Satisfied("Property location covered by scheme".to_string())
    }
}

fn check_benefits(inputs: &GrantEligibilityInputs) -> Check {
    match inputs.tenant_benefit_status {
        TenantBenefitStatus::Yes => {
            Check::Satisfied("Tenant receives qualifying benefits".to_string())
        }
        TenantBenefitStatus::No => {
            Check::Failed("Tenant must receive qualifying benefits for this scheme".to_string())
        }
        TenantBenefitStatus::Unknown => Check::Unknown(
            "Eligibility depends on tenant receiving qualifying benefits".to_string(),
        ),
    }
}

fn check_income(
    threshold: Money,
    benefits: BenefitRequirement,
    inputs: &GrantEligibilityInputs,
) -> Check {
    let pathway = benefits == BenefitRequirement::HelpsButOptional;
    let on_benefits = inputs.tenant_benefit_status;

    if pathway && on_benefits == TenantBenefitStatus::Yes {
        return Check::Satisfied(
            "Tenant qualifies through receiving qualifying benefits".to_string(),
        );
    }

    match inputs.tenant_income_status {
        TenantIncomeStatus::BelowThreshold => Check::Satisfied(format!(
            "Tenant household income below {threshold}"
        )),
        TenantIncomeStatus::AboveThreshold if !pathway => Check::Failed(format!(
            "Tenant income exceeds threshold ({threshold})"
        )),
        TenantIncomeStatus::AboveThreshold if on_benefits == TenantBenefitStatus::No => {
            Check::Failed(format!(
                "Tenant income exceeds threshold ({threshold}) and not on qualifying benefits"
            ))
        }
        _ if pathway => Check::Unknown(format!(
            "Eligibility depends on tenant income (below {threshold}) or benefit status"
        )),
        _ => Check::Unknown(format!(
            "Eligibility depends on tenant income (below {threshold})"
        )),
    }
}

fn next_steps(scheme: &GrantScheme, unresolved: &[Criterion]) -> Vec<String> {
    let mut steps = Vec::new();
    for criterion in unresolved {
        match criterion {
            Criterion::EpcRating => {
                steps.push("Get a valid EPC assessment for your property".to_string());
            }
            Criterion::TenantBenefits => {
                steps.push("Confirm whether your tenant receives qualifying benefits".to_string());
            }
            Criterion::TenantIncome => {
                steps.push("Confirm tenant household income status".to_string());
            }
            Criterion::Location => {
                steps.push("Confirm which local authority covers your property".to_string());
            }
            _ => {}
        }
    }
    steps.extend(scheme.application_steps.iter().cloned());
    steps.push(format!("Apply via {}", scheme.application_url));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_confidence_table() {
        assert_eq!(resolve_confidence(0, 0), Confidence::Definite);
        assert_eq!(resolve_confidence(3, 0), Confidence::Definite);
        assert_eq!(resolve_confidence(1, 1), Confidence::Possible);
        assert_eq!(resolve_confidence(3, 1), Confidence::Likely);
        assert_eq!(resolve_confidence(2, 1), Confidence::Possible);
        assert_eq!(resolve_confidence(4, 2), Confidence::Possible);
        assert_eq!(resolve_confidence(5, 2), Confidence::Likely);
    }

    #[test]
    fn test_resolving_an_unknown_never_lowers_confidence() {
        // Answering one unknown either drops it from the total (EPC,
        // location) or keeps the total and marks it satisfied.
        for total in 1..=6 {
            for unknown in 1..=total {
                let before = resolve_confidence(total, unknown).rank();
                assert!(resolve_confidence(total, unknown - 1).rank() >= before);
                assert!(resolve_confidence(total - 1, unknown - 1).rank() >= before);
            }
        }
    }
}
