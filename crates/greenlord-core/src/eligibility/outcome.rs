use crate::catalog::schema::GrantScheme;
use crate::model::{GrantEligibilityInputs, Money};
use crate::postcode::{LocalAuthority, Region};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How certain a scheme match is, given what the landlord could tell us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Definite,
    Likely,
    Possible,
    Ineligible,
}

impl Confidence {
    /// Ordering key; higher is more certain.
    pub fn rank(&self) -> u8 {
        match self {
            Confidence::Definite => 3,
            Confidence::Likely => 2,
            Confidence::Possible => 1,
            Confidence::Ineligible => 0,
        }
    }

    pub fn is_eligible(&self) -> bool {
        !matches!(self, Confidence::Ineligible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Definite => "definite",
            Confidence::Likely => "likely",
            Confidence::Possible => "possible",
            Confidence::Ineligible => "ineligible",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Definite => "Eligible",
            Confidence::Likely => "Likely eligible",
            Confidence::Possible => "Possibly eligible",
            Confidence::Ineligible => "Not eligible",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Confidence::Definite => "You meet all the requirements for this scheme",
            Confidence::Likely => "You likely qualify, but some details need confirmation",
            Confidence::Possible => "Eligibility depends on tenant circumstances",
            Confidence::Ineligible => "You do not meet the requirements for this scheme",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eligibility checks, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    OpenWindow,
    PropertyType,
    Tenure,
    RentalProperty,
    EpcRating,
    HeatingSystem,
    Location,
    TenantBenefits,
    TenantIncome,
}

impl Criterion {
    /// Checks that may be left unresolved by `unknown` answers.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Criterion::EpcRating
                | Criterion::Location
                | Criterion::TenantBenefits
                | Criterion::TenantIncome
        )
    }
}

/// The result of evaluating one scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantEligibilityMatch {
    pub scheme: GrantScheme,
    pub confidence: Confidence,
    /// `maxGrantValue` when eligible in any tier, zero otherwise.
    pub potential_value: Money,
    pub requires_contribution: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_contribution: Option<Money>,
    pub eligibility_reasons: Vec<String>,
    /// The disqualifying reason, or advisory "needs confirmation" notes when
    /// the match is not ineligible.
    pub ineligibility_reasons: Vec<String>,
    pub next_steps: Vec<String>,
    /// Criteria left undecided by `unknown` answers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_criteria: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_criterion: Option<Criterion>,
}

/// The outcome of one eligibility check across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantEligibilityResult {
    /// The inputs as evaluated, with the postcode normalized.
    pub inputs: GrantEligibilityInputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_authority: Option<LocalAuthority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    pub eligible_grants: Vec<GrantEligibilityMatch>,
    pub ineligible_grants: Vec<GrantEligibilityMatch>,
    /// Nominal sum of `potentialValue` over eligible grants.
    pub total_potential_value: Money,
    /// Like `totalPotentialValue`, but counting only the largest grant in
    /// each exclusion group.
    pub claimable_value: Money,
    pub summary_message: String,
    pub next_steps: Vec<String>,
    pub disclaimer: String,
    pub as_of: NaiveDate,
    pub catalog_version: String,
}

impl GrantEligibilityResult {
    pub fn count(&self, confidence: Confidence) -> usize {
        self.eligible_grants
            .iter()
            .chain(&self.ineligible_grants)
            .filter(|m| m.confidence == confidence)
            .count()
    }
}
