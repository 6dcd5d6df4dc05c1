//! Postcode to local authority resolution.
//!
//! Lookups work at outward-code granularity against compiled-in tables. A
//! well-formed postcode that is not in the tables resolves to `None`; it is
//! never an error.

pub mod builtin;

use crate::error::GrantError;
use crate::model::Postcode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    London,
    SouthEast,
    SouthWest,
    EastAnglia,
    EastMidlands,
    WestMidlands,
    NorthWest,
    NorthEast,
    Yorkshire,
    Wales,
    Scotland,
    NorthernIreland,
}

/// The UK nation a region belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nation {
    England,
    Wales,
    Scotland,
    NorthernIreland,
}

impl Region {
    pub fn nation(&self) -> Nation {
        match self {
            Region::Wales => Nation::Wales,
            Region::Scotland => Nation::Scotland,
            Region::NorthernIreland => Nation::NorthernIreland,
            _ => Nation::England,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::London => "London",
            Region::SouthEast => "South East",
            Region::SouthWest => "South West",
            Region::EastAnglia => "East Anglia",
            Region::EastMidlands => "East Midlands",
            Region::WestMidlands => "West Midlands",
            Region::NorthWest => "North West",
            Region::NorthEast => "North East",
            Region::Yorkshire => "Yorkshire",
            Region::Wales => "Wales",
            Region::Scotland => "Scotland",
            Region::NorthernIreland => "Northern Ireland",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A council that may administer local grant schemes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAuthority {
    pub id: String,
    pub name: String,
    pub region: Region,
    /// Outward codes (e.g. "M1", "NW3") covered by this authority.
    pub postcode_districts: Vec<String>,
    pub website_url: String,
    pub contact_email: String,
    pub contact_phone: String,
}

/// Resolves a validated postcode to its local authority and region.
///
/// Implementations must be pure: the same postcode always yields the same
/// answer, and an unmapped postcode yields `None` rather than an error.
pub trait AuthorityLookup {
    fn local_authority(&self, postcode: &Postcode) -> Option<&LocalAuthority>;

    fn region(&self, postcode: &Postcode) -> Option<Region>;

    fn authority_by_id(&self, id: &str) -> Option<&LocalAuthority>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityTableDef {
    pub version: String,
    pub authorities: Vec<LocalAuthority>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTableDef {
    pub version: String,
    pub areas: BTreeMap<String, Region>,
}

/// Table-driven resolver over compiled-in (or caller-supplied) data.
#[derive(Debug, Clone)]
pub struct StaticPostcodeResolver {
    authorities: Vec<LocalAuthority>,
    by_district: HashMap<String, usize>,
    areas: BTreeMap<String, Region>,
}

impl StaticPostcodeResolver {
    /// Build a resolver, rejecting districts claimed by more than one authority.
    pub fn new(
        authorities: Vec<LocalAuthority>,
        areas: BTreeMap<String, Region>,
    ) -> Result<Self, GrantError> {
        let mut by_district = HashMap::new();
        let mut seen_ids = HashMap::new();

        for (idx, authority) in authorities.iter().enumerate() {
            if authority.id.trim().is_empty() {
                return Err(GrantError::CatalogInvalid(
                    "local authority id must not be empty".into(),
                ));
            }
            if seen_ids.insert(authority.id.clone(), idx).is_some() {
                return Err(GrantError::CatalogInvalid(format!(
                    "duplicate local authority id '{}'",
                    authority.id
                )));
            }
            for district in &authority.postcode_districts {
                let key = district.trim().to_ascii_uppercase();
                if let Some(prev) = by_district.insert(key.clone(), idx) {
                    return Err(GrantError::CatalogInvalid(format!(
                        "postcode district '{}' is claimed by both '{}' and '{}'",
                        key, authorities[prev].id, authority.id
                    )));
                }
            }
        }

        Ok(Self {
            authorities,
            by_district,
            areas,
        })
    }

    pub fn builtin() -> Result<Self, GrantError> {
        let authorities = builtin::authority_table()?;
        let areas = builtin::area_table()?;
        Self::new(authorities.authorities, areas.areas)
    }

    pub fn authorities_in_region(&self, region: Region) -> Vec<&LocalAuthority> {
        self.authorities
            .iter()
            .filter(|a| a.region == region)
            .collect()
    }
}

impl AuthorityLookup for StaticPostcodeResolver {
    fn local_authority(&self, postcode: &Postcode) -> Option<&LocalAuthority> {
        let outward = postcode.outward();
        let idx = self.by_district.get(outward).or_else(|| {
            // Sub-districts such as "WC1A" belong to their parent district "WC1".
            let last = outward.chars().last()?;
            if last.is_ascii_alphabetic() {
                self.by_district.get(&outward[..outward.len() - 1])
            } else {
                None
            }
        })?;
        self.authorities.get(*idx)
    }

    fn region(&self, postcode: &Postcode) -> Option<Region> {
        self.areas.get(postcode.area()).copied()
    }

    fn authority_by_id(&self, id: &str) -> Option<&LocalAuthority> {
        self.authorities.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StaticPostcodeResolver {
        StaticPostcodeResolver::builtin().unwrap()
    }

    fn pc(raw: &str) -> Postcode {
        Postcode::parse(raw).unwrap()
    }

    #[test]
    fn test_resolves_exact_district() {
        let r = resolver();
        let la = r.local_authority(&pc("M1 4BT")).unwrap();
        assert_eq!(la.id, "manchester");
        assert_eq!(r.region(&pc("M1 4BT")), Some(Region::NorthWest));
    }

    #[test]
    fn test_no_prefix_bleed_between_districts() {
        // M17 is not a Manchester district even though "M1" is.
        let r = resolver();
        assert!(r.local_authority(&pc("M17 1AA")).is_none());
        assert_eq!(r.region(&pc("M17 1AA")), Some(Region::NorthWest));
    }

    #[test]
    fn test_sub_district_maps_to_parent() {
        let r = resolver();
        let la = r.local_authority(&pc("WC1A 1AA")).unwrap();
        assert_eq!(la.id, "camden");
    }

    #[test]
    fn test_lettered_district_matches_exactly() {
        let r = resolver();
        assert_eq!(r.local_authority(&pc("N1C 4AG")).unwrap().id, "camden");
        // N1 itself is Islington, not in the table.
        assert!(r.local_authority(&pc("N1 9GU")).is_none());
    }

    #[test]
    fn test_unmapped_postcode_is_none() {
        let r = resolver();
        let unmapped = pc("ZZ9 9ZZ");
        assert!(r.local_authority(&unmapped).is_none());
        assert!(r.region(&unmapped).is_none());
    }

    #[test]
    fn test_scottish_region() {
        let r = resolver();
        assert_eq!(r.region(&pc("EH1 1YZ")), Some(Region::Scotland));
        assert_eq!(Region::Scotland.nation(), Nation::Scotland);
    }

    #[test]
    fn test_duplicate_district_rejected() {
        let mut authorities = builtin::authority_table().unwrap().authorities;
        authorities[1].postcode_districts.push("M1".into());
        let err = StaticPostcodeResolver::new(authorities, BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("M1"));
    }

    #[test]
    fn test_authorities_in_region() {
        let r = resolver();
        let ids: Vec<&str> = r
            .authorities_in_region(Region::Yorkshire)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["leeds", "sheffield"]);
    }
}
