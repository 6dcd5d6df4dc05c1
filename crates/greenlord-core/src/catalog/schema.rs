use crate::model::{EpcRating, HeatingSystem, Money, PropertyType, Tenure};
use crate::postcode::{Nation, Region};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scheme catalog as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDef {
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub schemes: Vec<GrantScheme>,
}

/// A grant scheme and its declarative eligibility rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantScheme {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub detailed_description: String,
    pub administrator: Administrator,
    pub administrator_name: String,
    pub eligibility: EligibilityRules,
    #[serde(default)]
    pub coverage_categories: Vec<ImprovementCategory>,
    #[serde(default)]
    pub covered_improvements: Vec<String>,
    #[serde(default)]
    pub excluded_improvements: Vec<String>,
    pub max_grant_value: Money,
    #[serde(default)]
    pub min_grant_value: Option<Money>,
    pub requires_contribution: bool,
    #[serde(default)]
    pub contribution: ContributionFormula,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub application_url: String,
    #[serde(default)]
    pub info_url: Option<String>,
    pub last_verified: NaiveDate,
    pub data_source: String,
    #[serde(default)]
    pub display_priority: u32,
    /// Schemes sharing a group cannot both fund the same improvement.
    #[serde(default)]
    pub exclusion_group: Option<String>,
    #[serde(default)]
    pub application_steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl GrantScheme {
    /// Restricted to named local authorities rather than a whole nation.
    pub fn is_local(&self) -> bool {
        self.eligibility.local_authority_ids.is_some()
    }

    /// True when `date` falls within the scheme's open window.
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        if !self.is_active || date < self.start_date {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Administrator {
    EnergySupplier,
    Government,
    LocalAuthority,
}

impl fmt::Display for Administrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Administrator::EnergySupplier => write!(f, "Energy supplier"),
            Administrator::Government => write!(f, "Government"),
            Administrator::LocalAuthority => write!(f, "Local authority"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImprovementCategory {
    Insulation,
    Heating,
    Glazing,
    Ventilation,
    Renewable,
    Multiple,
}

impl ImprovementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImprovementCategory::Insulation => "insulation",
            ImprovementCategory::Heating => "heating",
            ImprovementCategory::Glazing => "glazing",
            ImprovementCategory::Ventilation => "ventilation",
            ImprovementCategory::Renewable => "renewable",
            ImprovementCategory::Multiple => "multiple",
        }
    }
}

/// Either no restriction, or an explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Allowed<T> {
    Any,
    Only(Vec<T>),
}

impl<T> Default for Allowed<T> {
    fn default() -> Self {
        Allowed::Any
    }
}

impl<T: PartialEq> Allowed<T> {
    pub fn permits(&self, value: &T) -> bool {
        match self {
            Allowed::Any => true,
            Allowed::Only(values) => values.contains(value),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Allowed::Only(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpcRequirement {
    #[default]
    Any,
    Bands(Vec<EpcRating>),
    /// Inclusive band range, e.g. D (best) to G (worst).
    Range { best: EpcRating, worst: EpcRating },
}

impl EpcRequirement {
    pub fn permits(&self, rating: EpcRating) -> bool {
        match self {
            EpcRequirement::Any => true,
            EpcRequirement::Bands(bands) => bands.contains(&rating),
            EpcRequirement::Range { best, worst } => rating >= *best && rating <= *worst,
        }
    }

    pub fn is_restricted(&self) -> bool {
        !matches!(self, EpcRequirement::Any)
    }

    pub fn describe(&self) -> String {
        match self {
            EpcRequirement::Any => "any rating".to_string(),
            EpcRequirement::Bands(bands) => bands
                .iter()
                .map(|b| b.as_str())
                .collect::<Vec<_>>()
                .join(" or "),
            EpcRequirement::Range { best, worst } if best == worst => best.to_string(),
            EpcRequirement::Range { best, worst } => format!("{best} to {worst}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingRule {
    #[serde(default)]
    pub allowed: Allowed<HeatingSystem>,
    #[serde(default)]
    pub forbidden: Vec<HeatingSystem>,
}

/// Geographic reach of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coverage {
    #[default]
    UkWide,
    GreatBritain,
    EnglandAndWales,
    England,
    Wales,
    Scotland,
    NorthernIreland,
}

impl Coverage {
    pub fn covers(&self, region: Region) -> bool {
        let nation = region.nation();
        match self {
            Coverage::UkWide => true,
            Coverage::GreatBritain => nation != Nation::NorthernIreland,
            Coverage::EnglandAndWales => matches!(nation, Nation::England | Nation::Wales),
            Coverage::England => nation == Nation::England,
            Coverage::Wales => nation == Nation::Wales,
            Coverage::Scotland => nation == Nation::Scotland,
            Coverage::NorthernIreland => nation == Nation::NorthernIreland,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Coverage::UkWide => "the UK",
            Coverage::GreatBritain => "Great Britain",
            Coverage::EnglandAndWales => "England and Wales",
            Coverage::England => "England",
            Coverage::Wales => "Wales",
            Coverage::Scotland => "Scotland",
            Coverage::NorthernIreland => "Northern Ireland",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenefitRequirement {
    Required,
    #[default]
    NotRequired,
    /// Benefits are an alternative route past the income threshold.
    HelpsButOptional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRules {
    #[serde(default)]
    pub property_types: Allowed<PropertyType>,
    #[serde(default)]
    pub tenures: Allowed<Tenure>,
    #[serde(default)]
    pub epc: EpcRequirement,
    #[serde(default)]
    pub heating: HeatingRule,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default)]
    pub local_authority_ids: Option<Vec<String>>,
    #[serde(default)]
    pub tenant_benefits: BenefitRequirement,
    /// Household income ceiling; tenants must be below it.
    #[serde(default)]
    pub income_threshold: Option<Money>,
    #[serde(default = "default_true")]
    pub allows_rental_properties: bool,
    #[serde(default)]
    pub additional_notes: Vec<String>,
}

/// How the landlord's own contribution is estimated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionFormula {
    #[default]
    None,
    /// Landlord pays `percent`% of the total cost; the grant covers the rest.
    ShareOfCost { percent: Decimal },
    Fixed { amount: Money },
}

impl ContributionFormula {
    pub fn is_none(&self) -> bool {
        matches!(self, ContributionFormula::None)
    }

    /// Estimated landlord contribution when the grant is paid at `grant`.
    pub fn estimate(&self, grant: Money) -> Option<Money> {
        match self {
            ContributionFormula::None => None,
            ContributionFormula::ShareOfCost { percent } => {
                if percent.is_zero() {
                    return None;
                }
                let hundred = Decimal::ONE_HUNDRED;
                let pence = Decimal::from(grant.pence()) * *percent / (hundred - *percent);
                pence
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
                    .map(Money::from_pence)
            }
            ContributionFormula::Fixed { amount } => Some(*amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_allowed_any_permits_everything() {
        let any: Allowed<PropertyType> = Allowed::Any;
        assert!(PropertyType::ALL.iter().all(|p| any.permits(p)));
        assert!(!any.is_restricted());
    }

    #[test]
    fn test_allowed_only_parses_from_json() {
        let only: Allowed<PropertyType> =
            serde_json::from_str(r#"{ "only": ["terraced-house", "flat"] }"#).unwrap();
        assert!(only.permits(&PropertyType::Flat));
        assert!(!only.permits(&PropertyType::Bungalow));
        let any: Allowed<PropertyType> = serde_json::from_str(r#""any""#).unwrap();
        assert_eq!(any, Allowed::Any);
    }

    #[test]
    fn test_epc_range_inclusive() {
        let req = EpcRequirement::Range {
            best: EpcRating::D,
            worst: EpcRating::G,
        };
        assert!(req.permits(EpcRating::D));
        assert!(req.permits(EpcRating::G));
        assert!(!req.permits(EpcRating::C));
        assert_eq!(req.describe(), "D to G");
    }

    #[test]
    fn test_epc_bands_describe() {
        let req = EpcRequirement::Bands(vec![EpcRating::E, EpcRating::F]);
        assert!(!req.permits(EpcRating::D));
        assert_eq!(req.describe(), "E or F");
    }

    #[test]
    fn test_coverage_by_nation() {
        assert!(Coverage::GreatBritain.covers(Region::Scotland));
        assert!(!Coverage::GreatBritain.covers(Region::NorthernIreland));
        assert!(Coverage::EnglandAndWales.covers(Region::Wales));
        assert!(!Coverage::England.covers(Region::Wales));
        assert!(Coverage::England.covers(Region::London));
    }

    #[test]
    fn test_share_of_cost_estimate() {
        let formula = ContributionFormula::ShareOfCost { percent: dec!(25) };
        // £10,000 grant covering 75% implies £3,333.33 from the landlord.
        assert_eq!(
            formula.estimate(Money::from_pounds(10_000)),
            Some(Money::from_pence(333_333))
        );
        let half = ContributionFormula::ShareOfCost { percent: dec!(50) };
        assert_eq!(
            half.estimate(Money::from_pounds(6_000)),
            Some(Money::from_pounds(6_000))
        );
    }

    #[test]
    fn test_zero_percent_has_no_estimate() {
        let formula = ContributionFormula::ShareOfCost { percent: dec!(0) };
        assert_eq!(formula.estimate(Money::from_pounds(1_000)), None);
        assert_eq!(ContributionFormula::None.estimate(Money::from_pounds(1)), None);
    }

    #[test]
    fn test_contribution_formula_json() {
        let formula: ContributionFormula =
            serde_json::from_str(r#"{ "share-of-cost": { "percent": "33" } }"#).unwrap();
        assert_eq!(formula, ContributionFormula::ShareOfCost { percent: dec!(33) });
        let none: ContributionFormula = serde_json::from_str(r#""none""#).unwrap();
        assert!(none.is_none());
    }
}
