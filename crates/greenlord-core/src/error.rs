use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid scheme catalog: {0}")]
    CatalogInvalid(String),

    #[error("failed to load scheme catalog from {path}: {reason}")]
    CatalogLoad { path: PathBuf, reason: String },

    #[error("unknown scheme '{0}'")]
    UnknownScheme(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field-level problems with an eligibility request, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: BTreeMap<&'static str, String>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, message.into());
        Self { errors }
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}
