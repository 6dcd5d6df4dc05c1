use greenlord_core::error::GrantError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), GrantError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
