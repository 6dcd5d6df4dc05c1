use crate::catalog::schema::CatalogDef;
use crate::error::GrantError;

const SCHEMES_JSON: &str = include_str!("../../../../data/schemes.json");

/// The compiled-in scheme catalog, parsed but not yet validated.
pub fn catalog_def() -> Result<CatalogDef, GrantError> {
    let def: CatalogDef = serde_json::from_str(SCHEMES_JSON)?;
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::validate_catalog;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let def = catalog_def().unwrap();
        assert_eq!(def.schemes.len(), 14);
        validate_catalog(&def).unwrap();
    }

    #[test]
    fn test_local_schemes_are_local() {
        let def = catalog_def().unwrap();
        let local = def.schemes.iter().filter(|s| s.is_local()).count();
        assert_eq!(local, 10);
    }
}
