//! npm package index access.
//!
//! [`PackageIndex`] is the capability seam for the public package index;
//! [`NpmRegistry`] talks to the npm registry API. The index is a
//! single-attempt, fail-soft signal: one fetch per package per run, and any
//! failure degrades that one signal to absent.

#[cfg(test)]
use mockall::automock;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Default base URL for the npm registry.
const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Errors that can occur during package-index reads.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Network error.
    #[error("Package index request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The index answered with an unexpected status or payload.
    #[error("Unexpected package index response: {0}")]
    InvalidResponse(String),
}

/// A published version's dependency declarations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexVersionManifest {
    pub dependencies: HashMap<String, serde_json::Value>,
    pub peer_dependencies: HashMap<String, serde_json::Value>,
}

impl IndexVersionManifest {
    /// The declared range for a dependency, peer declarations first.
    /// Non-string values are treated as absent.
    #[must_use]
    pub fn dependency_range(&self, package: &str) -> Option<&str> {
        self.peer_dependencies
            .get(package)
            .and_then(|value| value.as_str())
            .or_else(|| {
                self.dependencies
                    .get(package)
                    .and_then(|value| value.as_str())
            })
    }
}

/// The subset of an npm packument the scan uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpmPackument {
    #[serde(default)]
    pub versions: HashMap<String, IndexVersionManifest>,
}

/// Read access to a public package index.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// The packument of a package; `Ok(None)` when it was never published.
    async fn package_metadata(&self, package: &str)
        -> Result<Option<NpmPackument>, IndexError>;
}

/// npm-registry-backed [`PackageIndex`].
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a registry client with a custom base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("plugin-registry-scanner")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl PackageIndex for NpmRegistry {
    async fn package_metadata(
        &self,
        package: &str,
    ) -> Result<Option<NpmPackument>, IndexError> {
        let encoded_name = Self::encode_package_name(package);
        let url = format!("{}/{}", self.base_url, encoded_name);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(package, "Package not published to the index");
            return Ok(None);
        }

        if !status.is_success() {
            warn!(package, status = %status, "Package index returned unexpected status");
            return Err(IndexError::InvalidResponse(format!(
                "unexpected status: {status}"
            )));
        }

        let packument: NpmPackument = response.json().await.map_err(|e| {
            warn!(package, error = %e, "Failed to parse package index response");
            IndexError::InvalidResponse(e.to_string())
        })?;

        debug!(
            package,
            versions = packument.versions.len(),
            "Fetched package metadata"
        );
        Ok(Some(packument))
    }
}
