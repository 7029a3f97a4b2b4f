//! Scanner settings deserialization.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::epoch::Epoch;
use crate::retry::RetryPolicy;

/// Parsed settings from a scanner TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScannerSettings {
    /// npm package name of the platform core whose major lines define the
    /// epochs (e.g. `@scope/core`).
    pub core_package: String,

    /// Highest epoch the scan reasons about; the report covers `v0..=vN`.
    #[serde(default = "default_max_epoch")]
    pub max_epoch: u64,

    /// Branches inspected for manifests, most authoritative first. The
    /// repository default branch is always tried before these.
    #[serde(default = "default_branch_candidates")]
    pub branch_candidates: Vec<String>,

    /// Secondary manifest path tried when the root manifest defers to a
    /// workspace-internal placeholder.
    #[serde(default = "default_fallback_manifest_path")]
    pub fallback_manifest_path: String,

    /// Catalog entries resolved concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Attempts for idempotent repository-host reads.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the second attempt, in milliseconds; doubles per retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Package index base URL.
    #[serde(default = "default_npm_base_url")]
    pub npm_base_url: String,
}

pub(crate) fn default_max_epoch() -> u64 {
    2
}

pub(crate) fn default_branch_candidates() -> Vec<String> {
    ["main", "master", "next", "develop", "dev"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_fallback_manifest_path() -> String {
    "ui/package.json".to_string()
}

pub(crate) fn default_batch_size() -> usize {
    8
}

pub(crate) fn default_batch_pause_ms() -> u64 {
    1000
}

pub(crate) fn default_retry_attempts() -> u32 {
    3
}

pub(crate) fn default_retry_base_delay_ms() -> u64 {
    500
}

pub(crate) fn default_npm_base_url() -> String {
    "https://registry.npmjs.org".to_string()
}

impl ScannerSettings {
    /// The epochs the scan reasons about, lowest first.
    pub fn epochs(&self) -> impl Iterator<Item = Epoch> {
        (0..=self.max_epoch).map(Epoch)
    }

    /// Retry policy for idempotent repository-host reads.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Pause between batches.
    #[must_use]
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub(crate) fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let invalid = |key, message| ConfigError::InvalidSetting {
            path: path.to_string(),
            key,
            message,
        };
        if self.core_package.trim().is_empty() {
            return Err(invalid("core-package", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch-size", "must be at least 1"));
        }
        if self.retry_attempts == 0 {
            return Err(invalid("retry-attempts", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            core_package: String::new(),
            max_epoch: default_max_epoch(),
            branch_candidates: default_branch_candidates(),
            fallback_manifest_path: default_fallback_manifest_path(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            npm_base_url: default_npm_base_url(),
        }
    }
}
