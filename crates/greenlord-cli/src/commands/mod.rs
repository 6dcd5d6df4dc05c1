pub mod check;
pub mod postcode;
pub mod schemes;

use crate::config::CliConfig;
use greenlord_core::catalog;
use greenlord_core::error::GrantError;
use greenlord_core::postcode::StaticPostcodeResolver;
use greenlord_core::GrantEngine;
use tracing::info;

/// The engine every command runs against: the configured catalog, or the built-in one.
pub fn engine(config: &CliConfig) -> Result<GrantEngine, GrantError> {
    match &config.catalog {
        Some(path) => {
            let catalog = catalog::load_catalog(path)?;
            info!(
                path = %path.display(),
                version = catalog.version(),
                schemes = catalog.len(),
                "loaded scheme catalog"
            );
            GrantEngine::new(catalog, StaticPostcodeResolver::builtin()?)
        }
        None => GrantEngine::builtin(),
    }
}
