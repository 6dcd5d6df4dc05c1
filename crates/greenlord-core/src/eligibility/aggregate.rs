use crate::eligibility::outcome::{
    Confidence, Criterion, GrantEligibilityMatch, GrantEligibilityResult,
};
use crate::model::{CurrentEpcRating, GrantEligibilityInputs, Money, TenantBenefitStatus};
use crate::postcode::{LocalAuthority, Region};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DISCLAIMER: &str = "This tool provides indicative eligibility information based on \
the criteria you have provided. Grant scheme eligibility is determined by scheme administrators \
and may involve additional criteria not captured here. Scheme terms, funding availability, and \
eligibility requirements can change without notice. Always verify eligibility directly with \
scheme administrators before making decisions. Last updated: January 2026.";

/// Everything the aggregator needs besides the per-scheme matches.
pub struct ResultContext<'a> {
    pub inputs: GrantEligibilityInputs,
    pub local_authority: Option<&'a LocalAuthority>,
    pub region: Option<Region>,
    pub as_of: NaiveDate,
    pub catalog_version: &'a str,
}

/// Partition, sort, total and narrate per-scheme matches.
///
/// `matches` must be in catalog order; ties keep that order.
pub fn aggregate(
    matches: Vec<GrantEligibilityMatch>,
    ctx: ResultContext<'_>,
) -> GrantEligibilityResult {
    let (mut eligible, mut ineligible): (Vec<_>, Vec<_>) = matches
        .into_iter()
        .partition(|m| m.confidence.is_eligible());

    // Both sorts are stable.
    eligible.sort_by(|a, b| {
        b.confidence
            .rank()
            .cmp(&a.confidence.rank())
            .then_with(|| b.potential_value.cmp(&a.potential_value))
    });
    ineligible.sort_by_key(|m| m.scheme.display_priority);

    let total_potential_value: Money = eligible.iter().map(|m| m.potential_value).sum();
    let claimable_value = claimable_value(&eligible);

    let summary_message = summary_message(
        &eligible,
        &ineligible,
        total_potential_value,
        claimable_value,
    );
    let next_steps = result_next_steps(&eligible, &ctx.inputs, ctx.local_authority);

    GrantEligibilityResult {
        inputs: ctx.inputs,
        local_authority: ctx.local_authority.cloned(),
        region: ctx.region,
        eligible_grants: eligible,
        ineligible_grants: ineligible,
        total_potential_value,
        claimable_value,
        summary_message,
        next_steps,
        disclaimer: DISCLAIMER.to_string(),
        as_of: ctx.as_of,
        catalog_version: ctx.catalog_version.to_string(),
    }
}

/// Sum of eligible grants, counting only the largest in each exclusion group.
pub fn claimable_value(eligible: &[GrantEligibilityMatch]) -> Money {
    let mut grouped: BTreeMap<&str, Money> = BTreeMap::new();
    let mut ungrouped = Money::ZERO;

    for m in eligible {
        match m.scheme.exclusion_group.as_deref() {
            Some(group) => {
                let best = grouped.entry(group).or_insert(Money::ZERO);
                *best = (*best).max(m.potential_value);
            }
            None => ungrouped = ungrouped + m.potential_value,
        }
    }

    ungrouped + grouped.into_values().sum::<Money>()
}

/// The ineligible scheme that got furthest through the checks.
///
/// Closed schemes are never suggested; ties go to the lower display priority.
pub fn closest_missed(ineligible: &[GrantEligibilityMatch]) -> Option<&GrantEligibilityMatch> {
    ineligible
        .iter()
        .filter(|m| {
            m.failed_criterion
                .is_some_and(|c| c != Criterion::OpenWindow)
        })
        .min_by(|a, b| {
            b.failed_criterion
                .cmp(&a.failed_criterion)
                .then_with(|| a.scheme.display_priority.cmp(&b.scheme.display_priority))
        })
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn summary_message(
    eligible: &[GrantEligibilityMatch],
    ineligible: &[GrantEligibilityMatch],
    total: Money,
    claimable: Money,
) -> String {
    if eligible.is_empty() {
        let mut message = "Based on the information provided, we could not identify any grant \
            schemes you are currently eligible for. This may be because your property's EPC \
            rating is too high, or tenant eligibility criteria are not met."
            .to_string();
        if let Some(closest) = closest_missed(ineligible) {
            let reason = closest
                .ineligibility_reasons
                .first()
                .map(String::as_str)
                .unwrap_or("criteria not met");
            message.push_str(&format!(
                " The closest match was {} ({}).",
                closest.scheme.name, reason
            ));
        }
        message.push_str(" Consider checking back as new schemes are regularly announced.");
        return message;
    }

    let count = |c: Confidence| eligible.iter().filter(|m| m.confidence == c).count();
    let definite = count(Confidence::Definite);
    let likely = count(Confidence::Likely);
    let possible = count(Confidence::Possible);
    let n = eligible.len();

    let mut message = if definite > 0 {
        format!(
            "Good news! We found {n} grant scheme{} you may be eligible for, with combined \
             potential funding of up to {total}. You appear to definitely qualify for \
             {definite} scheme{}.",
            plural(n),
            plural(definite)
        )
    } else {
        format!(
            "We found {n} grant scheme{} you may be eligible for, subject to confirming some \
             details, with combined potential funding of up to {total}.",
            plural(n)
        )
    };

    if likely > 0 {
        let verb = if likely == 1 { "is" } else { "are" };
        message.push_str(&format!(
            " {likely} scheme{} {verb} likely to be available.",
            plural(likely)
        ));
    }
    if possible > 0 {
        message.push_str(&format!(
            " {possible} scheme{} may be possible pending confirmation of your circumstances.",
            plural(possible)
        ));
    }
    if claimable < total {
        message.push_str(&format!(
            " Some of these schemes cannot fund the same improvement, so up to {claimable} \
             may be claimable together."
        ));
    }

    message
}

fn result_next_steps(
    eligible: &[GrantEligibilityMatch],
    inputs: &GrantEligibilityInputs,
    local_authority: Option<&LocalAuthority>,
) -> Vec<String> {
    let mut steps = Vec::new();

    if eligible.is_empty() {
        steps.push(
            "Consider getting a professional EPC assessment to explore improvement options"
                .to_string(),
        );
        steps.push("Contact your local authority about any local grant schemes".to_string());
        return steps;
    }

    if inputs.current_epc_rating == CurrentEpcRating::Unknown {
        steps.push(
            "Get an EPC assessment to confirm your property rating and unlock grant eligibility"
                .to_string(),
        );
    }

    let tenant_unresolved = eligible.iter().any(|m| {
        m.unresolved_criteria
            .iter()
            .any(|c| matches!(c, Criterion::TenantBenefits | Criterion::TenantIncome))
    });
    if tenant_unresolved {
        if inputs.tenant_benefit_status == TenantBenefitStatus::Unknown {
            steps.push("Check with your tenant about qualifying benefits status".to_string());
        } else {
            steps.push("Check with your tenant about household income status".to_string());
        }
    }

    if let Some(la) = local_authority {
        steps.push(format!(
            "Contact {} ({}) about local grant schemes",
            la.name, la.contact_phone
        ));
    }

    steps.push("Keep records of any quotes received for cost cap exemption purposes".to_string());
    steps.push(
        "Consider combining multiple schemes to maximise funding (where allowed)".to_string(),
    );
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemeCatalog;

    fn matched(catalog: &SchemeCatalog, id: &str, confidence: Confidence) -> GrantEligibilityMatch {
        let scheme = catalog.get(id).unwrap().clone();
        let eligible = confidence.is_eligible();
        GrantEligibilityMatch {
            potential_value: if eligible {
                scheme.max_grant_value
            } else {
                Money::ZERO
            },
            requires_contribution: scheme.requires_contribution,
            scheme,
            confidence,
            estimated_contribution: None,
            eligibility_reasons: Vec::new(),
            ineligibility_reasons: if eligible {
                Vec::new()
            } else {
                vec!["failed".to_string()]
            },
            next_steps: Vec::new(),
            unresolved_criteria: Vec::new(),
            failed_criterion: (!eligible).then_some(Criterion::EpcRating),
        }
    }

    #[test]
    fn test_claimable_counts_exclusion_group_once() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let eligible = vec![
            matched(&catalog, "eco4", Confidence::Definite),
            matched(&catalog, "great-british-insulation-scheme", Confidence::Definite),
            matched(&catalog, "boiler-upgrade-scheme", Confidence::Definite),
        ];
        // ECO4 (£15,000) and GBIS (£8,000) share a group; BUS is separate.
        assert_eq!(claimable_value(&eligible), Money::from_pounds(22_500));
    }

    #[test]
    fn test_closest_missed_prefers_latest_failure() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let mut early = matched(&catalog, "eco4", Confidence::Ineligible);
        early.failed_criterion = Some(Criterion::PropertyType);
        let mut late = matched(&catalog, "camden-green-homes", Confidence::Ineligible);
        late.failed_criterion = Some(Criterion::TenantIncome);
        let mut closed = matched(&catalog, "warm-homes-local", Confidence::Ineligible);
        closed.failed_criterion = Some(Criterion::OpenWindow);

        let ineligible = vec![early, late, closed];
        let closest = closest_missed(&ineligible).unwrap();
        assert_eq!(closest.scheme.id, "camden-green-homes");
    }

    #[test]
    fn test_closest_missed_ties_break_on_priority() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let ineligible = vec![
            matched(&catalog, "camden-green-homes", Confidence::Ineligible),
            matched(&catalog, "boiler-upgrade-scheme", Confidence::Ineligible),
        ];
        let closest = closest_missed(&ineligible).unwrap();
        assert_eq!(closest.scheme.id, "boiler-upgrade-scheme");
    }

    #[test]
    fn test_summary_without_definite_is_qualified() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let eligible = vec![matched(&catalog, "eco4", Confidence::Possible)];
        let total = Money::from_pounds(15_000);
        let message = summary_message(&eligible, &[], total, total);
        assert!(!message.starts_with("Good news"));
        assert!(message.contains("£15,000"));
        assert!(message.contains("1 scheme may be possible"));
    }

    #[test]
    fn test_summary_names_closest_missed() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let ineligible = vec![matched(&catalog, "boiler-upgrade-scheme", Confidence::Ineligible)];
        let message = summary_message(&[], &ineligible, Money::ZERO, Money::ZERO);
        assert!(message.contains("could not identify any grant schemes"));
        assert!(message.contains("Boiler Upgrade Scheme (BUS)"));
    }
}
