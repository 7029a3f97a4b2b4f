//! Registry report shaping.
//!
//! The report is the persisted output of a run: `lastUpdatedAt` plus a
//! `registry` object keyed by catalog identifier. Keys sort lexicographically
//! (BTreeMap) so output is deterministic regardless of fetch completion
//! order. Host-metadata fields keep their upstream names
//! (`stargazers_count`); nested fields invented here are camelCase.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{CompatibilityVerdict, PackageIndexInfo, TagInfo};
use crate::catalog::RepoCoordinate;
use crate::github::RepoMetadata;
use crate::manifest::ManifestInfo;

/// The full persisted report.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(rename = "lastUpdatedAt")]
    pub last_updated_at: DateTime<Utc>,
    pub registry: BTreeMap<String, RegistryEntry>,
}

impl Report {
    /// Stamps a registry snapshot with the generation time.
    #[must_use]
    pub fn new(registry: BTreeMap<String, RegistryEntry>) -> Self {
        Report {
            last_updated_at: Utc::now(),
            registry,
        }
    }

    /// Pretty-printed JSON for the output file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One catalog entry's resolved state.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    pub git: GitInfo,
    /// `null` when the package was never published to the index.
    pub npm: Option<NpmInfo>,
    /// Epoch label (`v0`, `v1`, ...) to supported.
    pub supports: BTreeMap<String, bool>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub topics: Vec<String>,
    pub stargazers_count: Option<u32>,
    pub language: Option<String>,
    /// Present only when the package self-declares as an application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<serde_json::Value>,
}

/// Repository identity and per-epoch display tags.
#[derive(Debug, Clone, Serialize)]
pub struct GitInfo {
    pub owner: String,
    pub repo: String,
    /// Epoch label to best tag name, tag text verbatim.
    pub tags: BTreeMap<String, String>,
}

/// Package-index identity and per-epoch best publications.
#[derive(Debug, Clone, Serialize)]
pub struct NpmInfo {
    pub package: String,
    /// Epoch label to the epoch's best published version.
    pub versions: BTreeMap<String, NpmVersionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpmVersionInfo {
    pub version: String,
    #[serde(rename = "coreRange", skip_serializing_if = "Option::is_none")]
    pub core_range: Option<String>,
}

impl RegistryEntry {
    /// Assembles one entry from a repository's resolved signals. Absent
    /// signals produce empty or null fields, never panics.
    #[must_use]
    pub fn assemble(
        coordinate: &RepoCoordinate,
        metadata: Option<RepoMetadata>,
        tag_info: &TagInfo,
        index_info: Option<&PackageIndexInfo>,
        verdict: &CompatibilityVerdict,
        manifests: &[ManifestInfo],
    ) -> Self {
        let metadata = metadata.unwrap_or_default();
        let declared = manifests.iter().find(|manifest| manifest.kind.is_some());

        RegistryEntry {
            git: GitInfo {
                owner: coordinate.owner.clone(),
                repo: coordinate.name.clone(),
                tags: tag_info
                    .per_epoch
                    .iter()
                    .map(|(epoch, tag)| (epoch.to_string(), tag.clone()))
                    .collect(),
            },
            npm: index_info.map(|info| NpmInfo {
                package: info.package.clone(),
                versions: info
                    .per_epoch
                    .iter()
                    .map(|(epoch, evidence)| {
                        (
                            epoch.to_string(),
                            NpmVersionInfo {
                                version: evidence.version.raw.clone(),
                                core_range: evidence.core_range.clone(),
                            },
                        )
                    })
                    .collect(),
            }),
            supports: verdict
                .supported
                .iter()
                .map(|(epoch, supported)| (epoch.to_string(), *supported))
                .collect(),
            description: metadata.description,
            homepage: metadata.homepage,
            topics: metadata.topics,
            stargazers_count: metadata.stargazers_count,
            language: metadata.language,
            kind: declared.and_then(|manifest| manifest.kind.clone()),
            app: declared.and_then(|manifest| manifest.app.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{IndexEvidence, SupportSource};
    use crate::epoch::Epoch;
    use crate::versions::Selected;
    use semver::Version;

    fn coordinate() -> RepoCoordinate {
        RepoCoordinate::parse("github:owner/some-plugin").unwrap()
    }

    fn verdict() -> CompatibilityVerdict {
        let mut verdict = CompatibilityVerdict::default();
        for epoch in 0..=2 {
            verdict.supported.insert(Epoch(epoch), epoch == 2);
        }
        verdict.sources.insert(
            Epoch(2),
            SupportSource::Index {
                version: Version::new(2, 1, 0),
            },
        );
        verdict
    }

    #[test]
    fn serializes_exact_field_names() {
        let mut tag_info = TagInfo::default();
        tag_info
            .per_epoch
            .insert(Epoch(2), "v2.1.0".to_string());

        let index_info = PackageIndexInfo {
            package: "some-plugin".to_string(),
            per_epoch: [(
                Epoch(2),
                IndexEvidence {
                    version: Selected {
                        raw: "2.1.0".to_string(),
                        version: Version::new(2, 1, 0),
                    },
                    core_range: Some("^2.0.0".to_string()),
                },
            )]
            .into_iter()
            .collect(),
        };

        let metadata = RepoMetadata {
            description: Some("A plugin".to_string()),
            homepage: None,
            topics: vec!["platform".to_string()],
            stargazers_count: Some(42),
            language: Some("JavaScript".to_string()),
            default_branch: Some("main".to_string()),
        };

        let entry = RegistryEntry::assemble(
            &coordinate(),
            Some(metadata),
            &tag_info,
            Some(&index_info),
            &verdict(),
            &[],
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["git"]["owner"], "owner");
        assert_eq!(value["git"]["repo"], "some-plugin");
        assert_eq!(value["git"]["tags"]["v2"], "v2.1.0");
        assert_eq!(value["npm"]["package"], "some-plugin");
        assert_eq!(value["npm"]["versions"]["v2"]["version"], "2.1.0");
        assert_eq!(value["npm"]["versions"]["v2"]["coreRange"], "^2.0.0");
        assert_eq!(value["supports"]["v0"], false);
        assert_eq!(value["supports"]["v2"], true);
        assert_eq!(value["stargazers_count"], 42);
        assert_eq!(value["language"], "JavaScript");
        assert_eq!(value["homepage"], serde_json::Value::Null);
        // Not an application: kind/app are omitted entirely.
        assert!(value.get("kind").is_none());
        assert!(value.get("app").is_none());
    }

    #[test]
    fn unpublished_package_serializes_null_npm() {
        let entry = RegistryEntry::assemble(
            &coordinate(),
            None,
            &TagInfo::default(),
            None,
            &verdict(),
            &[],
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert!(value["npm"].is_null());
        assert_eq!(value["topics"], serde_json::json!([]));
        assert!(value["description"].is_null());
    }

    #[test]
    fn app_declaration_appears_in_output() {
        let manifests = vec![ManifestInfo {
            version: Some(Version::new(1, 0, 0)),
            core_range: Some("^1.0.0".to_string()),
            source_branch: "main".to_string(),
            kind: Some("app".to_string()),
            app: Some(serde_json::json!({"title": "Example App"})),
        }];

        let entry = RegistryEntry::assemble(
            &coordinate(),
            None,
            &TagInfo::default(),
            None,
            &verdict(),
            &manifests,
        );
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["kind"], "app");
        assert_eq!(value["app"]["title"], "Example App");
    }

    #[test]
    fn report_serializes_timestamp_and_sorted_registry() {
        let mut registry = BTreeMap::new();
        for id in ["zeta-plugin", "alpha-plugin"] {
            registry.insert(
                id.to_string(),
                RegistryEntry::assemble(
                    &coordinate(),
                    None,
                    &TagInfo::default(),
                    None,
                    &verdict(),
                    &[],
                ),
            );
        }

        let report = Report::new(registry);
        let value = serde_json::to_value(&report).unwrap();

        assert!(value["lastUpdatedAt"].is_string());
        let keys: Vec<&String> =
            value["registry"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["alpha-plugin", "zeta-plugin"]);
    }
}
