use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

/// Settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub log_level: String,
    /// Replacement scheme catalog; the built-in one is used when unset.
    pub catalog: Option<PathBuf>,
    /// Fixed evaluation date; today when unset.
    pub as_of: Option<NaiveDate>,
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("GREENLORD_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        let catalog = env::var("GREENLORD_CATALOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let as_of = match env::var("GREENLORD_AS_OF") {
            Ok(value) if !value.trim().is_empty() => Some(
                NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| ConfigError::InvalidDate { value })?,
            ),
            _ => None,
        };

        Ok(Self {
            log_level,
            catalog,
            as_of,
        })
    }

    /// The evaluation date: an explicit override, then the configured date, then today.
    pub fn evaluation_date(&self, override_date: Option<NaiveDate>) -> NaiveDate {
        override_date
            .or(self.as_of)
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GREENLORD_AS_OF must be a date in YYYY-MM-DD form, got '{value}'")]
    InvalidDate { value: String },
}
