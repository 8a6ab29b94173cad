use std::path::PathBuf;

use crate::currency::{self, RateTable};
use crate::error::Result;
use crate::reference::{self, ReferenceTable};

/// Return the user data directory for model-pricing tables, if there is one.
pub fn data_dir() -> Option<PathBuf> {
    Some(dirs::data_dir()?.join("model-pricing"))
}

/// Return the path to a user-provided data file.
pub fn data_path(filename: &str) -> Option<PathBuf> {
    Some(data_dir()?.join(filename))
}

/// Rates from the user data dir when present and valid, otherwise bundled.
pub fn load_rates_user_or_bundled() -> Result<RateTable> {
    if let Some(path) = data_path("rates.toml").filter(|p| p.exists()) {
        match currency::load_rates(&path) {
            Ok(table) => return Ok(table),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring user rate table")
            }
        }
    }
    currency::load_bundled_rates()
}

/// Reference prices from the user data dir when present and valid, otherwise bundled.
pub fn load_reference_user_or_bundled() -> Result<ReferenceTable> {
    if let Some(path) = data_path("reference_prices.toml").filter(|p| p.exists()) {
        match reference::load_reference(&path) {
            Ok(table) => return Ok(table),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring user reference table")
            }
        }
    }
    reference::load_bundled_reference()
}
