//! Scanner configuration loading.
//!
//! This module handles parsing the scanner settings TOML file that names the
//! platform-core package and tunes batching, retries, and manifest lookup.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::ScannerSettings;

use std::path::Path;

use tracing::info;

/// Loads scanner settings from a TOML file.
///
/// # Arguments
///
/// * `path` - Path to the settings file
///
/// # Returns
///
/// The validated settings.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, not valid TOML, or
/// fails validation (empty core package, zero batch size or retry attempts).
pub fn load_settings(path: &Path) -> Result<ScannerSettings, ConfigError> {
    info!(path = %path.display(), "Loading scanner settings");

    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;

    let settings: ScannerSettings =
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

    settings.validate(&path.display().to_string())?;

    info!(
        core_package = %settings.core_package,
        max_epoch = settings.max_epoch,
        "Loaded scanner settings"
    );
    Ok(settings)
}
