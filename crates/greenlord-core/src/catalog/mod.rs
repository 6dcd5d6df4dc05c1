pub mod builtin;
pub mod schema;

use crate::error::GrantError;
use crate::model::Money;
use crate::postcode::AuthorityLookup;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schema::{
    Allowed, CatalogDef, ContributionFormula, EpcRequirement, GrantScheme, ImprovementCategory,
};
use std::collections::HashSet;
use std::path::Path;

/// Days after `lastVerified` before a national scheme should be re-checked.
const NATIONAL_REFRESH_DAYS: i64 = 7;
/// Local authority schemes change less often.
const LOCAL_REFRESH_DAYS: i64 = 14;

/// The validated, read-only set of grant schemes.
#[derive(Debug, Clone)]
pub struct SchemeCatalog {
    version: String,
    schemes: Vec<GrantScheme>,
}

impl SchemeCatalog {
    /// Validate a parsed catalog definition and freeze it.
    pub fn from_def(def: CatalogDef) -> Result<Self, GrantError> {
        validate_catalog(&def)?;
        Ok(Self {
            version: def.version,
            schemes: def.schemes,
        })
    }

    /// The compiled-in catalog.
    pub fn builtin() -> Result<Self, GrantError> {
        Self::from_def(builtin::catalog_def()?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Every scheme, in catalog order.
    pub fn schemes(&self) -> &[GrantScheme] {
        &self.schemes
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GrantScheme> {
        self.schemes.iter().find(|s| s.id == id)
    }

    /// Schemes with no local authority restriction.
    pub fn national(&self) -> Vec<&GrantScheme> {
        self.schemes.iter().filter(|s| !s.is_local()).collect()
    }

    /// Schemes restricted to the given local authority.
    pub fn for_local_authority(&self, authority_id: &str) -> Vec<&GrantScheme> {
        self.schemes
            .iter()
            .filter(|s| {
                s.eligibility
                    .local_authority_ids
                    .as_ref()
                    .is_some_and(|ids| ids.iter().any(|id| id == authority_id))
            })
            .collect()
    }

    pub fn by_category(&self, category: ImprovementCategory) -> Vec<&GrantScheme> {
        self.schemes
            .iter()
            .filter(|s| s.coverage_categories.contains(&category))
            .collect()
    }

    /// Schemes whose details were last verified too long before `today`.
    pub fn needing_refresh(&self, today: NaiveDate) -> Vec<&GrantScheme> {
        self.schemes
            .iter()
            .filter(|s| {
                let limit = if s.is_local() {
                    LOCAL_REFRESH_DAYS
                } else {
                    NATIONAL_REFRESH_DAYS
                };
                (today - s.last_verified).num_days() > limit
            })
            .collect()
    }

    /// Check that every local authority a scheme names is known to `lookup`.
    pub fn check_authorities(&self, lookup: &dyn AuthorityLookup) -> Result<(), GrantError> {
        for scheme in &self.schemes {
            let Some(ids) = &scheme.eligibility.local_authority_ids else {
                continue;
            };
            for id in ids {
                if lookup.authority_by_id(id).is_none() {
                    return Err(GrantError::CatalogInvalid(format!(
                        "scheme '{}' references unknown local authority '{}'",
                        scheme.id, id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Load a scheme catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<SchemeCatalog, GrantError> {
    let content = std::fs::read_to_string(path).map_err(|e| GrantError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_catalog(&content, path)
}

/// Parse a scheme catalog from a JSON string.
pub fn parse_catalog(json: &str, source: &Path) -> Result<SchemeCatalog, GrantError> {
    let def: CatalogDef = serde_json::from_str(json).map_err(|e| GrantError::CatalogLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    SchemeCatalog::from_def(def)
}

/// Parse a scheme catalog from a JSON string (no file path context).
pub fn parse_catalog_str(json: &str) -> Result<SchemeCatalog, GrantError> {
    let def: CatalogDef = serde_json::from_str(json).map_err(GrantError::Json)?;
    SchemeCatalog::from_def(def)
}

/// Validate that a catalog is well-formed.
pub fn validate_catalog(def: &CatalogDef) -> Result<(), GrantError> {
    if def.schemes.is_empty() {
        return Err(GrantError::CatalogInvalid("schemes must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for scheme in &def.schemes {
        if scheme.id.trim().is_empty() {
            return Err(GrantError::CatalogInvalid(
                "scheme id must not be empty".into(),
            ));
        }
        if !seen.insert(scheme.id.as_str()) {
            return Err(GrantError::CatalogInvalid(format!(
                "duplicate scheme id '{}'",
                scheme.id
            )));
        }
        validate_scheme(scheme).map_err(|reason| {
            GrantError::CatalogInvalid(format!("scheme '{}' {}", scheme.id, reason))
        })?;
    }

    // Totals are summed per result, so the whole catalog must fit.
    def.schemes
        .iter()
        .try_fold(Money::ZERO, |total, s| total.checked_add(s.max_grant_value))
        .ok_or_else(|| {
            GrantError::CatalogInvalid(
                "combined maxGrantValue of all schemes is too large".into(),
            )
        })?;

    Ok(())
}

fn validate_scheme(scheme: &GrantScheme) -> Result<(), String> {
    if scheme.name.trim().is_empty() {
        return Err("has an empty name".into());
    }

    if scheme.max_grant_value.is_negative() {
        return Err(format!(
            "has a negative maxGrantValue ({})",
            scheme.max_grant_value
        ));
    }
    if let Some(min) = scheme.min_grant_value {
        if min.is_negative() || min > scheme.max_grant_value {
            return Err(format!(
                "has minGrantValue {} outside 0..={}",
                min, scheme.max_grant_value
            ));
        }
    }

    if let Some(end) = scheme.end_date {
        if end < scheme.start_date {
            return Err(format!(
                "ends ({}) before it starts ({})",
                end, scheme.start_date
            ));
        }
    }

    match &scheme.contribution {
        ContributionFormula::None => {}
        _ if !scheme.requires_contribution => {
            return Err("has a contribution formula but requiresContribution is false".into());
        }
        ContributionFormula::ShareOfCost { percent } => {
            if *percent < Decimal::ZERO || *percent >= Decimal::ONE_HUNDRED {
                return Err(format!("has contribution percent {percent} outside [0, 100)"));
            }
        }
        ContributionFormula::Fixed { amount } => {
            if amount.is_negative() {
                return Err(format!("has a negative fixed contribution ({amount})"));
            }
        }
    }

    let rules = &scheme.eligibility;
    if matches!(&rules.property_types, Allowed::Only(v) if v.is_empty()) {
        return Err("allows no property types".into());
    }
    if matches!(&rules.tenures, Allowed::Only(v) if v.is_empty()) {
        return Err("allows no tenures".into());
    }
    if matches!(&rules.heating.allowed, Allowed::Only(v) if v.is_empty()) {
        return Err("allows no heating systems".into());
    }
    match &rules.epc {
        EpcRequirement::Bands(bands) if bands.is_empty() => {
            return Err("allows no EPC bands".into());
        }
        EpcRequirement::Range { best, worst } if best > worst => {
            return Err(format!("has an inverted EPC range ({best} to {worst})"));
        }
        _ => {}
    }
    if let Some(ids) = &rules.local_authority_ids {
        if ids.is_empty() || ids.iter().any(|id| id.trim().is_empty()) {
            return Err("has an empty localAuthorityIds list".into());
        }
    }
    if rules.income_threshold.is_some_and(|t| t.is_negative()) {
        return Err("has a negative incomeThreshold".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postcode::StaticPostcodeResolver;
    use std::io::Write;

    fn minimal(extra: &str) -> String {
        format!(
            r#"{{
                "version": "test",
                "schemes": [{{
                    "id": "test-scheme",
                    "name": "Test scheme",
                    "description": "A scheme",
                    "administrator": "government",
                    "administratorName": "DESNZ",
                    "eligibility": {{}},
                    "maxGrantValue": 500000,
                    "requiresContribution": false,
                    "startDate": "2024-01-01",
                    "applicationUrl": "https://example.org/apply",
                    "lastVerified": "2026-01-15",
                    "dataSource": "test"
                    {extra}
                }}]
            }}"#
        )
    }

    #[test]
    fn test_parse_minimal_catalog() {
        let catalog = parse_catalog_str(&minimal("")).unwrap();
        assert_eq!(catalog.version(), "test");
        assert_eq!(catalog.len(), 1);
        let scheme = catalog.get("test-scheme").unwrap();
        assert!(scheme.is_active);
        assert!(scheme.eligibility.allows_rental_properties);
        assert!(!scheme.is_local());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = parse_catalog_str(&minimal(r#", "endDate": "2023-12-31""#)).unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn test_negative_value_rejected() {
        let json = minimal("").replace("500000", "-1");
        assert!(parse_catalog_str(&json).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let json = minimal("").replace("\"Test scheme\"", "\"  \"");
        let err = parse_catalog_str(&json).unwrap_err();
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_formula_without_contribution_flag_rejected() {
        let json = minimal(r#", "contribution": { "share-of-cost": { "percent": "25" } }"#);
        assert!(parse_catalog_str(&json).is_err());

        let ok = json.replace(
            "\"requiresContribution\": false",
            "\"requiresContribution\": true",
        );
        assert!(parse_catalog_str(&ok).is_ok());
    }

    #[test]
    fn test_percent_out_of_range_rejected() {
        let json = minimal(r#", "contribution": { "share-of-cost": { "percent": "100" } }"#)
            .replace(
                "\"requiresContribution\": false",
                "\"requiresContribution\": true",
            );
        assert!(parse_catalog_str(&json).is_err());
    }

    #[test]
    fn test_inverted_epc_range_rejected() {
        let json = minimal("").replace(
            "\"eligibility\": {}",
            r#""eligibility": { "epc": { "range": { "best": "G", "worst": "D" } } }"#,
        );
        let err = parse_catalog_str(&json).unwrap_err();
        assert!(err.to_string().contains("inverted EPC range"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let catalog = parse_catalog_str(&minimal("")).unwrap();
        let scheme = catalog.schemes()[0].clone();
        let def = CatalogDef {
            version: "dup".into(),
            description: None,
            schemes: vec![scheme.clone(), scheme],
        };
        let err = SchemeCatalog::from_def(def).unwrap_err();
        assert!(err.to_string().contains("duplicate scheme id"));
    }

    #[test]
    fn test_combined_value_overflow_rejected() {
        let catalog = parse_catalog_str(&minimal("")).unwrap();
        let mut first = catalog.schemes()[0].clone();
        first.max_grant_value = Money::from_pence(i64::MAX / 2 + 1);
        let mut second = first.clone();
        second.id = "test-scheme-2".into();
        let def = CatalogDef {
            version: "huge".into(),
            description: None,
            schemes: vec![first, second],
        };
        let err = SchemeCatalog::from_def(def).unwrap_err();
        assert!(matches!(err, GrantError::CatalogInvalid(_)));
        assert!(err.to_string().contains("combined maxGrantValue"));
    }

    #[test]
    fn test_unknown_field_value_is_load_error() {
        let json = minimal("").replace("\"government\"", "\"charity\"");
        assert!(matches!(
            parse_catalog_str(&json),
            Err(GrantError::Json(_))
        ));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal("").as_bytes()).unwrap();
        let catalog = load_catalog(file.path()).unwrap();
        assert!(catalog.get("test-scheme").is_some());
    }

    #[test]
    fn test_load_catalog_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = load_catalog(file.path()).unwrap_err();
        match err {
            GrantError::CatalogLoad { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected CatalogLoad, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load_catalog(Path::new("/nonexistent/schemes.json")).unwrap_err();
        assert!(matches!(err, GrantError::CatalogLoad { .. }));
    }

    #[test]
    fn test_builtin_queries() {
        let catalog = SchemeCatalog::builtin().unwrap();
        assert!(catalog.get("eco4").is_some());
        assert!(catalog.get("no-such-scheme").is_none());

        let national: Vec<&str> = catalog.national().iter().map(|s| s.id.as_str()).collect();
        assert!(national.contains(&"boiler-upgrade-scheme"));
        assert!(!national.contains(&"camden-green-homes"));
        assert_eq!(
            national,
            vec![
                "eco4",
                "boiler-upgrade-scheme",
                "warm-homes-local",
                "great-british-insulation-scheme"
            ]
        );

        let leeds: Vec<&str> = catalog
            .for_local_authority("leeds")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(leeds, vec!["leeds-home-energy-efficiency"]);

        assert!(catalog
            .by_category(ImprovementCategory::Renewable)
            .iter()
            .any(|s| s.id == "boiler-upgrade-scheme"));
    }

    #[test]
    fn test_needing_refresh_uses_scope_specific_windows() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        assert!(catalog.needing_refresh(date("2026-01-29")).is_empty());

        let stale: Vec<&str> = catalog
            .needing_refresh(date("2026-02-05"))
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        // National schemes verified 2026-01-28 are past their weekly check.
        assert!(stale.contains(&"eco4"));
        assert!(stale.contains(&"warm-homes-local"));
        // Local schemes get a fortnight.
        assert!(stale.contains(&"leicester-affordable-warmth"));
        assert!(!stale.contains(&"birmingham-warm-homes"));
        assert!(!stale.contains(&"camden-green-homes"));
    }

    #[test]
    fn test_builtin_authorities_are_known() {
        let catalog = SchemeCatalog::builtin().unwrap();
        let resolver = StaticPostcodeResolver::builtin().unwrap();
        catalog.check_authorities(&resolver).unwrap();
    }

    #[test]
    fn test_unknown_authority_rejected() {
        let json = minimal("").replace(
            "\"eligibility\": {}",
            r#""eligibility": { "localAuthorityIds": ["atlantis"] }"#,
        );
        let catalog = parse_catalog_str(&json).unwrap();
        let resolver = StaticPostcodeResolver::builtin().unwrap();
        let err = catalog.check_authorities(&resolver).unwrap_err();
        assert!(err.to_string().contains("atlantis"));
    }
}
