//! Manifest resolution for a (repository, branch) pair.
//!
//! A resolution starts at the root `package.json`. When the root declares the
//! platform-core dependency through a workspace-internal placeholder, a
//! single best-effort attempt is made at a configured secondary path (the
//! conventional publishable package inside a monorepo); a non-placeholder
//! secondary manifest supersedes the root wholly. No root manifest means no
//! resolution for the branch at all.

use std::collections::HashMap;

use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::RepoCoordinate;
use crate::config::ScannerSettings;
use crate::epoch::CoreRange;
use crate::github::{HostError, RepositoryHost};
use crate::retry::with_retries;
use crate::versions::parse_loose;

/// Manifest path tried first on every candidate branch.
const ROOT_MANIFEST_PATH: &str = "package.json";

/// The subset of a `package.json` the scan reads. Every field is optional;
/// real manifests omit most of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageManifest {
    pub version: Option<String>,
    pub dependencies: HashMap<String, serde_json::Value>,
    pub peer_dependencies: HashMap<String, serde_json::Value>,
    /// Self-declared package kind; `"app"` marks the repository as an
    /// application rather than a plugin.
    pub kind: Option<String>,
    /// Free-form application metadata, passed through to the report.
    pub app: Option<serde_json::Value>,
}

impl PackageManifest {
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

/// Evidence extracted from one branch's manifest. No epoch classification
/// happens here; the aggregator interprets the raw range.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestInfo {
    pub version: Option<Version>,
    pub core_range: Option<String>,
    pub source_branch: String,
    pub kind: Option<String>,
    pub app: Option<serde_json::Value>,
}

impl ManifestInfo {
    fn from_manifest(manifest: &PackageManifest, core_package: &str, branch: &str) -> Self {
        ManifestInfo {
            version: manifest.version.as_deref().and_then(parse_loose),
            core_range: manifest
                .dependency_range(core_package)
                .map(str::to_string),
            source_branch: branch.to_string(),
            kind: manifest.kind.clone(),
            app: manifest.app.clone(),
        }
    }

    /// Whether the declared core range only resolves inside the package's
    /// own source tree.
    #[must_use]
    pub fn has_placeholder_range(&self) -> bool {
        self.core_range
            .as_deref()
            .is_some_and(|range| CoreRange::parse(range).is_placeholder())
    }
}

/// Resolves manifest evidence for one branch.
///
/// The root fetch runs under the configured retry policy; a transport
/// failure after retries surfaces as an error so the caller can record an
/// issue note. A missing or unparseable root manifest resolves to `None`.
///
/// # Errors
///
/// Returns an error when the root manifest fetch fails after exhausting
/// retries. The secondary fetch never errors; it is single-attempt and all
/// its failures are silent.
pub async fn resolve_manifest(
    host: &dyn RepositoryHost,
    coordinate: &RepoCoordinate,
    branch: &str,
    settings: &ScannerSettings,
) -> Result<Option<ManifestInfo>, HostError> {
    let raw = with_retries(settings.retry_policy(), "manifest fetch", || {
        host.file_content(coordinate, ROOT_MANIFEST_PATH, branch)
    })
    .await?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let manifest: PackageManifest = match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(error) => {
            warn!(
                repo = %coordinate,
                branch,
                error = %error,
                "Skipping unparseable root manifest"
            );
            return Ok(None);
        }
    };

    let info = ManifestInfo::from_manifest(&manifest, &settings.core_package, branch);
    if !info.has_placeholder_range() {
        return Ok(Some(info));
    }

    // The root defers to the workspace; the nested publishable package may
    // carry the real range. One attempt, failures silent.
    match host
        .file_content(coordinate, &settings.fallback_manifest_path, branch)
        .await
    {
        Ok(Some(secondary_raw)) => {
            if let Ok(secondary) = serde_json::from_str::<PackageManifest>(&secondary_raw) {
                let secondary_info =
                    ManifestInfo::from_manifest(&secondary, &settings.core_package, branch);
                if secondary_info.core_range.is_some()
                    && !secondary_info.has_placeholder_range()
                {
                    debug!(
                        repo = %coordinate,
                        branch,
                        path = %settings.fallback_manifest_path,
                        "Secondary manifest supersedes workspace placeholder"
                    );
                    return Ok(Some(secondary_info));
                }
            }
        }
        Ok(None) => {}
        Err(error) => {
            debug!(
                repo = %coordinate,
                branch,
                error = %error,
                "Secondary manifest fetch failed, keeping root manifest"
            );
        }
    }

    // The placeholder stays visible downstream so the branch is recorded as
    // unresolved rather than dropped.
    Ok(Some(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockRepositoryHost;

    fn settings() -> ScannerSettings {
        ScannerSettings {
            core_package: "@scope/core".to_string(),
            retry_attempts: 1,
            retry_base_delay_ms: 0,
            ..ScannerSettings::default()
        }
    }

    fn coordinate() -> RepoCoordinate {
        RepoCoordinate::parse("github:owner/repo").unwrap()
    }

    #[test]
    fn dependency_range_prefers_peer_declarations() {
        let manifest: PackageManifest = serde_json::from_str(
            r#"{
                "dependencies": {"@scope/core": "^1.0.0"},
                "peerDependencies": {"@scope/core": "^2.0.0"}
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.dependency_range("@scope/core"), Some("^2.0.0"));
    }

    #[tokio::test]
    async fn missing_root_manifest_resolves_to_none() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .withf(|_, path, branch| path == "package.json" && branch == "main")
            .returning(|_, _, _| Ok(None));

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn unparseable_root_manifest_resolves_to_none() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .returning(|_, _, _| Ok(Some("{not json".to_string())));

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn extracts_version_and_core_range_from_root() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .withf(|_, path, _| path == "package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{
                        "version": "2.1.0",
                        "peerDependencies": {"@scope/core": "^2.0.0"}
                    }"#
                    .to_string(),
                ))
            });

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.version, Some(Version::new(2, 1, 0)));
        assert_eq!(resolved.core_range.as_deref(), Some("^2.0.0"));
        assert_eq!(resolved.source_branch, "main");
        assert!(resolved.kind.is_none());
    }

    #[tokio::test]
    async fn secondary_manifest_supersedes_placeholder_range() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .withf(|_, path, _| path == "package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{
                        "version": "0.1.0",
                        "dependencies": {"@scope/core": "workspace:*"}
                    }"#
                    .to_string(),
                ))
            });
        host.expect_file_content()
            .withf(|_, path, _| path == "ui/package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{
                        "version": "1.3.0",
                        "peerDependencies": {"@scope/core": "^1.0.0"}
                    }"#
                    .to_string(),
                ))
            });

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.version, Some(Version::new(1, 3, 0)));
        assert_eq!(resolved.core_range.as_deref(), Some("^1.0.0"));
    }

    #[tokio::test]
    async fn placeholder_root_survives_when_secondary_is_also_placeholder() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .withf(|_, path, _| path == "package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{
                        "version": "0.1.0",
                        "dependencies": {"@scope/core": "workspace:*"}
                    }"#
                    .to_string(),
                ))
            });
        host.expect_file_content()
            .withf(|_, path, _| path == "ui/package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{"dependencies": {"@scope/core": "catalog:default"}}"#.to_string(),
                ))
            });

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.core_range.as_deref(), Some("workspace:*"));
        assert!(resolved.has_placeholder_range());
    }

    #[tokio::test]
    async fn secondary_fetch_failure_is_silent() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .withf(|_, path, _| path == "package.json")
            .returning(|_, _, _| {
                Ok(Some(
                    r#"{
                        "version": "0.1.0",
                        "dependencies": {"@scope/core": "workspace:*"}
                    }"#
                    .to_string(),
                ))
            });
        host.expect_file_content()
            .withf(|_, path, _| path == "ui/package.json")
            .times(1)
            .returning(|_, _, _| {
                Err(HostError::Transport {
                    message: "connection reset".to_string(),
                })
            });

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap()
            .unwrap();

        assert!(resolved.has_placeholder_range());
    }

    #[tokio::test]
    async fn root_fetch_failure_propagates_after_retries() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content()
            .times(2)
            .returning(|_, _, _| {
                Err(HostError::Transport {
                    message: "connection reset".to_string(),
                })
            });

        let mut settings = settings();
        settings.retry_attempts = 2;
        let result = resolve_manifest(&host, &coordinate(), "main", &settings).await;
        assert!(matches!(result, Err(HostError::Transport { .. })));
    }

    #[tokio::test]
    async fn app_declaration_passes_through() {
        let mut host = MockRepositoryHost::new();
        host.expect_file_content().returning(|_, _, _| {
            Ok(Some(
                r#"{
                    "version": "1.0.0",
                    "dependencies": {"@scope/core": "^1.0.0"},
                    "kind": "app",
                    "app": {"title": "Example App"}
                }"#
                .to_string(),
            ))
        });

        let resolved = resolve_manifest(&host, &coordinate(), "main", &settings())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.kind.as_deref(), Some("app"));
        assert_eq!(
            resolved.app,
            Some(serde_json::json!({"title": "Example App"}))
        );
    }
}
