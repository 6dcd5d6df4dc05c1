use super::{AreaTableDef, AuthorityTableDef};
use crate::error::GrantError;

const LOCAL_AUTHORITIES_JSON: &str = include_str!("../../../../data/local-authorities.json");
const POSTCODE_AREAS_JSON: &str = include_str!("../../../../data/postcode-areas.json");

/// The compiled-in local authority table.
pub fn authority_table() -> Result<AuthorityTableDef, GrantError> {
    let table: AuthorityTableDef = serde_json::from_str(LOCAL_AUTHORITIES_JSON)?;
    Ok(table)
}

/// The compiled-in postcode area to region table.
pub fn area_table() -> Result<AreaTableDef, GrantError> {
    let table: AreaTableDef = serde_json::from_str(POSTCODE_AREAS_JSON)?;
    Ok(table)
}
