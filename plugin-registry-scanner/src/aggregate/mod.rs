//! Evidence aggregation into a per-epoch support verdict.
//!
//! The effectful half ([`resolve_branch_manifests`]) fans manifest fetches
//! out across candidate branches; the pure half ([`aggregate`]) folds branch
//! and package-index evidence into one [`CompatibilityVerdict`]. Tag evidence
//! never participates in the fold; it only decorates the report.

mod evidence;

pub use evidence::{IndexEvidence, PackageIndexInfo, TagInfo};

use std::collections::BTreeMap;

use futures::future::join_all;
use semver::Version;
use tracing::{debug, warn};

use crate::catalog::RepoCoordinate;
use crate::config::ScannerSettings;
use crate::epoch::{CoreRange, Epoch};
use crate::github::RepositoryHost;
use crate::manifest::{resolve_manifest, ManifestInfo};

/// The evidence that established support for an epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportSource {
    /// A branch manifest whose version and core range agree on the epoch.
    Manifest { version: Version, branch: String },
    /// A published version whose declared core range covers the epoch.
    Index { version: Version },
}

/// One repository's per-epoch support determination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityVerdict {
    /// Closed world: every epoch under `max-epoch` has an entry, and no
    /// evidence means `false`, not unknown.
    pub supported: BTreeMap<Epoch, bool>,
    pub sources: BTreeMap<Epoch, SupportSource>,
    pub issues: Vec<String>,
}

impl CompatibilityVerdict {
    #[must_use]
    pub fn supports(&self, epoch: Epoch) -> bool {
        self.supported.get(&epoch).copied().unwrap_or(false)
    }
}

/// The ordered branch preference list for manifest resolution: the
/// repository default branch first, then the configured candidates, filtered
/// to branches that exist.
#[must_use]
pub fn candidate_branches(
    default_branch: Option<&str>,
    configured: &[String],
    existing: &[String],
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for name in default_branch
        .into_iter()
        .chain(configured.iter().map(String::as_str))
    {
        if existing.iter().any(|branch| branch == name)
            && !candidates.iter().any(|candidate| candidate == name)
        {
            candidates.push(name.to_string());
        }
    }
    candidates
}

/// Resolves manifests for every candidate branch concurrently, folding
/// results back in candidate order. Branches whose fetch fails after retries
/// become issue notes; the rest of the fan-out is unaffected.
pub async fn resolve_branch_manifests(
    host: &dyn RepositoryHost,
    coordinate: &RepoCoordinate,
    branches: &[String],
    settings: &ScannerSettings,
) -> (Vec<ManifestInfo>, Vec<String>) {
    let fetches = branches
        .iter()
        .map(|branch| resolve_manifest(host, coordinate, branch, settings));
    let outcomes = join_all(fetches).await;

    let mut manifests = Vec::new();
    let mut issues = Vec::new();
    for (branch, outcome) in branches.iter().zip(outcomes) {
        match outcome {
            Ok(Some(info)) => manifests.push(info),
            Ok(None) => debug!(repo = %coordinate, branch, "No manifest on branch"),
            Err(error) => {
                warn!(repo = %coordinate, branch, error = %error, "Manifest fetch failed");
                issues.push(format!(
                    "{coordinate}: manifest on '{branch}' unavailable: {error}"
                ));
            }
        }
    }
    (manifests, issues)
}

/// Folds branch-manifest and package-index evidence into a verdict.
///
/// Branch pass: a manifest whose version major and core range agree marks
/// that epoch supported; the first branch to claim an epoch keeps it for the
/// pass. Index pass: the best published version per epoch marks the epoch
/// supported when its declared range covers it, superseding branch sources;
/// a declared range anchored to a *different* epoch is a contradiction —
/// recorded as an issue, with the declared epoch marked supported, because
/// declared intent outranks the version number.
#[must_use]
pub fn aggregate(
    manifests: &[ManifestInfo],
    index_info: Option<&PackageIndexInfo>,
    settings: &ScannerSettings,
) -> CompatibilityVerdict {
    let mut verdict = CompatibilityVerdict::default();
    for epoch in settings.epochs() {
        verdict.supported.insert(epoch, false);
    }
    let max_epoch = Epoch(settings.max_epoch);

    for manifest in manifests {
        let (Some(version), Some(raw_range)) = (&manifest.version, &manifest.core_range)
        else {
            continue;
        };
        let epoch = Epoch(version.major);
        if epoch > max_epoch {
            continue;
        }
        if CoreRange::parse(raw_range).intersects(epoch) {
            verdict.supported.insert(epoch, true);
            verdict
                .sources
                .entry(epoch)
                .or_insert_with(|| SupportSource::Manifest {
                    version: version.clone(),
                    branch: manifest.source_branch.clone(),
                });
        }
    }

    let Some(index_info) = index_info else {
        return verdict;
    };

    for (epoch, evidence) in &index_info.per_epoch {
        let Some(raw_range) = &evidence.core_range else {
            continue;
        };
        let range = CoreRange::parse(raw_range);
        let version = &evidence.version.version;

        if range.intersects(*epoch) {
            verdict.supported.insert(*epoch, true);
            verdict.sources.insert(
                *epoch,
                SupportSource::Index {
                    version: version.clone(),
                },
            );
        }

        if let Some(dominant) = range.dominant_epoch() {
            if dominant != *epoch {
                verdict.issues.push(format!(
                    "{}: claims a {} version ({}) but depends on a {} core ('{}')",
                    index_info.package, epoch, version, dominant, raw_range
                ));
                if dominant <= max_epoch {
                    verdict.supported.insert(dominant, true);
                    verdict
                        .sources
                        .entry(dominant)
                        .or_insert_with(|| SupportSource::Index {
                            version: version.clone(),
                        });
                }
            }
        }
    }

    verdict
}
