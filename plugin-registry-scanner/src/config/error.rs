//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading scanner settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file missing or unreadable.
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML or misses required keys.
    #[error("Failed to parse settings in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A setting deserialized but its value cannot drive a scan.
    #[error("Invalid setting '{key}' in '{path}': {message}")]
    InvalidSetting {
        path: String,
        key: &'static str,
        message: &'static str,
    },
}
