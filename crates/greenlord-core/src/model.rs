use crate::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use std::sync::LazyLock;

/// A string did not name any variant of an input enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    DetachedHouse,
    SemiDetachedHouse,
    TerracedHouse,
    Bungalow,
    Flat,
    Maisonette,
    Hmo,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::DetachedHouse,
        PropertyType::SemiDetachedHouse,
        PropertyType::TerracedHouse,
        PropertyType::Bungalow,
        PropertyType::Flat,
        PropertyType::Maisonette,
        PropertyType::Hmo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::DetachedHouse => "detached-house",
            PropertyType::SemiDetachedHouse => "semi-detached-house",
            PropertyType::TerracedHouse => "terraced-house",
            PropertyType::Bungalow => "bungalow",
            PropertyType::Flat => "flat",
            PropertyType::Maisonette => "maisonette",
            PropertyType::Hmo => "hmo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::DetachedHouse => "Detached house",
            PropertyType::SemiDetachedHouse => "Semi-detached house",
            PropertyType::TerracedHouse => "Terraced house",
            PropertyType::Bungalow => "Bungalow",
            PropertyType::Flat => "Flat or apartment",
            PropertyType::Maisonette => "Maisonette",
            PropertyType::Hmo => "House in multiple occupation (HMO)",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("property type", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tenure {
    Freehold,
    Leasehold,
}

impl Tenure {
    pub const ALL: [Tenure; 2] = [Tenure::Freehold, Tenure::Leasehold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tenure::Freehold => "freehold",
            Tenure::Leasehold => "leasehold",
        }
    }
}

impl fmt::Display for Tenure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenure::Freehold => write!(f, "Freehold"),
            Tenure::Leasehold => write!(f, "Leasehold"),
        }
    }
}

impl FromStr for Tenure {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("tenure", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeatingSystem {
    GasBoiler,
    OilBoiler,
    Lpg,
    Electric,
    HeatPump,
    Other,
}

impl HeatingSystem {
    pub const ALL: [HeatingSystem; 6] = [
        HeatingSystem::GasBoiler,
        HeatingSystem::OilBoiler,
        HeatingSystem::Lpg,
        HeatingSystem::Electric,
        HeatingSystem::HeatPump,
        HeatingSystem::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeatingSystem::GasBoiler => "gas-boiler",
            HeatingSystem::OilBoiler => "oil-boiler",
            HeatingSystem::Lpg => "lpg",
            HeatingSystem::Electric => "electric",
            HeatingSystem::HeatPump => "heat-pump",
            HeatingSystem::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeatingSystem::GasBoiler => "Gas boiler",
            HeatingSystem::OilBoiler => "Oil boiler",
            HeatingSystem::Lpg => "LPG boiler",
            HeatingSystem::Electric => "Electric heating",
            HeatingSystem::HeatPump => "Heat pump",
            HeatingSystem::Other => "Other",
        }
    }
}

impl fmt::Display for HeatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeatingSystem {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("heating system", s))
    }
}

/// EPC band. Declaration order runs from best (A) to worst (G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpcRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl EpcRating {
    pub const ALL: [EpcRating; 7] = [
        EpcRating::A,
        EpcRating::B,
        EpcRating::C,
        EpcRating::D,
        EpcRating::E,
        EpcRating::F,
        EpcRating::G,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EpcRating::A => "A",
            EpcRating::B => "B",
            EpcRating::C => "C",
            EpcRating::D => "D",
            EpcRating::E => "E",
            EpcRating::F => "F",
            EpcRating::G => "G",
        }
    }
}

impl fmt::Display for EpcRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpcRating {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("EPC rating", s))
    }
}

/// The landlord's current EPC band, which they may not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrentEpcRating {
    Rated(EpcRating),
    Unknown,
}

impl CurrentEpcRating {
    pub fn rating(&self) -> Option<EpcRating> {
        match self {
            CurrentEpcRating::Rated(rating) => Some(*rating),
            CurrentEpcRating::Unknown => None,
        }
    }
}

impl fmt::Display for CurrentEpcRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentEpcRating::Rated(rating) => write!(f, "{rating}"),
            CurrentEpcRating::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for CurrentEpcRating {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("unknown") {
            return Ok(CurrentEpcRating::Unknown);
        }
        s.parse::<EpcRating>()
            .map(CurrentEpcRating::Rated)
            .map_err(|_| ParseEnumError::new("EPC rating", s))
    }
}

impl TryFrom<String> for CurrentEpcRating {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrentEpcRating> for String {
    fn from(value: CurrentEpcRating) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TenantBenefitStatus {
    Yes,
    No,
    Unknown,
}

impl TenantBenefitStatus {
    pub const ALL: [TenantBenefitStatus; 3] = [
        TenantBenefitStatus::Yes,
        TenantBenefitStatus::No,
        TenantBenefitStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenantBenefitStatus::Yes => "yes",
            TenantBenefitStatus::No => "no",
            TenantBenefitStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for TenantBenefitStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("tenant benefit status", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TenantIncomeStatus {
    BelowThreshold,
    AboveThreshold,
    Unknown,
}

impl TenantIncomeStatus {
    pub const ALL: [TenantIncomeStatus; 3] = [
        TenantIncomeStatus::BelowThreshold,
        TenantIncomeStatus::AboveThreshold,
        TenantIncomeStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenantIncomeStatus::BelowThreshold => "below-threshold",
            TenantIncomeStatus::AboveThreshold => "above-threshold",
            TenantIncomeStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for TenantIncomeStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("tenant income status", s))
    }
}

/// An amount of money in pence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_pence(pence: i64) -> Money {
        Money(pence)
    }

    pub const fn from_pounds(pounds: i64) -> Money {
        Money(pounds * 100)
    }

    pub fn pence(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Sum that reports overflow instead of clamping.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

/// Saturates at the `i64` bounds.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let pounds = (abs / 100).to_string();

        // Thousands separators, en-GB style.
        let mut grouped = String::with_capacity(pounds.len() + pounds.len() / 3);
        for (i, c) in pounds.chars().enumerate() {
            if i > 0 && (pounds.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        match abs % 100 {
            0 => write!(f, "{sign}£{grouped}"),
            p => write!(f, "{sign}£{grouped}.{p:02}"),
        }
    }
}

static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{1,2}[0-9]{1,2}[A-Z]?)\s*([0-9][A-Z]{2})$")
        .expect("postcode pattern is a valid regex")
});

/// A UK postcode in canonical form: uppercase, single space before the inward code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Postcode {
    normalized: String,
    outward_len: usize,
}

impl Postcode {
    pub fn parse(raw: &str) -> Result<Postcode, ValidationError> {
        let upper = raw.trim().to_ascii_uppercase();
        let caps = POSTCODE_RE
            .captures(&upper)
            .ok_or_else(|| ValidationError::single("postcode", "Please enter a valid UK postcode"))?;

        let outward = &caps[1];
        let inward = &caps[2];
        Ok(Postcode {
            normalized: format!("{outward} {inward}"),
            outward_len: outward.len(),
        })
    }

    pub fn is_valid(raw: &str) -> bool {
        Postcode::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The district part, e.g. "NW1" for "NW1 6XE".
    pub fn outward(&self) -> &str {
        &self.normalized[..self.outward_len]
    }

    pub fn inward(&self) -> &str {
        &self.normalized[self.outward_len + 1..]
    }

    /// The leading letters of the outward code, e.g. "NW" for "NW1 6XE".
    pub fn area(&self) -> &str {
        let outward = self.outward();
        let end = outward
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(outward.len());
        &outward[..end]
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl TryFrom<String> for Postcode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Postcode::parse(&value)
    }
}

impl From<Postcode> for String {
    fn from(value: Postcode) -> Self {
        value.normalized
    }
}

/// One eligibility request, as collected by the grant checker form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrantEligibilityInputs {
    pub postcode: String,
    pub property_type: PropertyType,
    pub tenure: Tenure,
    pub heating_system: HeatingSystem,
    pub current_epc_rating: CurrentEpcRating,
    pub tenant_benefit_status: TenantBenefitStatus,
    pub tenant_income_status: TenantIncomeStatus,
}

impl GrantEligibilityInputs {
    pub fn postcode(&self) -> Result<Postcode, ValidationError> {
        Postcode::parse(&self.postcode)
    }
}
