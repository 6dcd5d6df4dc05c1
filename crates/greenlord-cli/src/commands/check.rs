use chrono::NaiveDate;
use greenlord_core::error::GrantError;
use greenlord_core::inputs::InputForm;
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::output;

pub fn run(
    form: InputForm,
    input_file: Option<PathBuf>,
    as_of: NaiveDate,
    output_format: &str,
    verbose: bool,
    config: &CliConfig,
) -> Result<(), GrantError> {
    // A saved form (camelCase keys) replaces the flags entirely.
    let form = match input_file {
        Some(path) => {
            let json_bytes = std::fs::read(&path)?;
            serde_json::from_slice::<InputForm>(&json_bytes)?
        }
        None => form,
    };
    let inputs = form.validate()?;

    let engine = super::engine(config)?;
    let result = engine.evaluate_as_of(&inputs, as_of)?;

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print(&result, verbose),
    }

    Ok(())
}
