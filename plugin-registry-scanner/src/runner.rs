//! Orchestrates catalog-wide compatibility scans.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use octocrab::Octocrab;
use tracing::{info, warn};

use crate::aggregate::{
    aggregate, candidate_branches, resolve_branch_manifests, PackageIndexInfo, TagInfo,
};
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::ScannerSettings;
use crate::github::{GitHubHost, RepositoryHost};
use crate::npm::{NpmRegistry, PackageIndex};
use crate::rate_limit::wait_if_needed;
use crate::report::{RegistryEntry, Report};
use crate::retry::with_retries;
use crate::summary::{ProcessingResult, RunSummary};

/// Configuration for running a scan against live providers.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Scanner settings (batching, retries, epochs, manifest lookup).
    settings: ScannerSettings,
    /// GitHub token used for API calls.
    token: String,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    #[must_use]
    pub fn new(settings: ScannerSettings, token: String) -> Self {
        Self { settings, token }
    }

    /// Returns the scanner settings.
    #[must_use]
    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Returns the configured GitHub token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Errors that can occur while constructing a runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),
}

/// Everything a completed run produces: the report to persist and the
/// summary for operator output.
#[derive(Debug)]
pub struct RunOutput {
    pub report: Report,
    pub summary: RunSummary,
}

/// Drives catalog entries through resolution in bounded batches.
pub struct Runner {
    settings: ScannerSettings,
    host: Arc<dyn RepositoryHost>,
    index: Arc<dyn PackageIndex>,
}

impl Runner {
    /// Builds a runner against the live GitHub API and npm registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub client cannot be constructed.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let octocrab = Octocrab::builder()
            .personal_token(config.token().to_string())
            .build()?;
        let index = NpmRegistry::new(&config.settings().npm_base_url);
        Ok(Self::with_providers(
            config.settings,
            Arc::new(GitHubHost::new(octocrab)),
            Arc::new(index),
        ))
    }

    /// Builds a runner over arbitrary provider implementations.
    #[must_use]
    pub fn with_providers(
        settings: ScannerSettings,
        host: Arc<dyn RepositoryHost>,
        index: Arc<dyn PackageIndex>,
    ) -> Self {
        Self {
            settings,
            host,
            index,
        }
    }

    /// Executes the full scan.
    ///
    /// Entries resolve concurrently within a fixed-size batch; batches run
    /// sequentially with a pause and a proactive rate-limit check between
    /// them. No per-entry failure is fatal; every catalog entry that entered
    /// resolution appears in the report.
    pub async fn run(&self, catalog: &Catalog) -> RunOutput {
        let mut summary = RunSummary::new();
        for skipped in &catalog.skipped {
            summary.record_result(&ProcessingResult::Skipped {
                id: skipped.id.clone(),
                reason: skipped.reason.clone(),
            });
        }

        let mut registry = BTreeMap::new();
        if catalog.entries.is_empty() {
            warn!("No usable catalog entries");
            return RunOutput {
                report: Report::new(registry),
                summary,
            };
        }

        info!(
            entries = catalog.entries.len(),
            batch_size = self.settings.batch_size,
            "Scanning catalog"
        );

        for (batch_index, batch) in
            catalog.entries.chunks(self.settings.batch_size).enumerate()
        {
            if batch_index > 0 {
                tokio::time::sleep(self.settings.batch_pause()).await;
            }
            self.pause_for_quota().await;

            let outcomes = join_all(batch.iter().map(|entry| self.process_entry(entry))).await;
            for (entry, result) in outcomes {
                registry.insert(result.id().to_string(), entry);
                summary.record_result(&result);
            }
        }

        info!(
            resolved = summary.entries_resolved,
            degraded = summary.entries_degraded,
            issues = summary.issues.len(),
            "Scan complete"
        );
        RunOutput {
            report: Report::new(registry),
            summary,
        }
    }

    /// Before each batch: sleep until quota reset when the core-API budget
    /// is nearly spent. A failed quota read never blocks the batch.
    async fn pause_for_quota(&self) {
        match self.host.rate_limit().await {
            Ok(Some(rate_limit)) => {
                wait_if_needed(&rate_limit).await;
            }
            Ok(None) => {}
            Err(error) => warn!(error = %error, "Could not read host rate limit"),
        }
    }

    /// Resolves one catalog entry into a registry entry plus its outcome.
    /// Every external failure degrades a signal and records an issue note;
    /// nothing propagates.
    async fn process_entry(&self, entry: &CatalogEntry) -> (RegistryEntry, ProcessingResult) {
        let coordinate = &entry.coordinate;
        let policy = self.settings.retry_policy();
        let mut issues = Vec::new();
        let mut degraded = false;

        // The four top-level signals are independent; fetch them together.
        // Index reads are single-attempt by policy, host reads retried.
        let (branches, tags, metadata, packument) = tokio::join!(
            with_retries(policy, "branch listing", || self
                .host
                .list_branches(coordinate)),
            with_retries(policy, "tag listing", || self.host.list_tags(coordinate)),
            with_retries(policy, "repository metadata", || self
                .host
                .repo_metadata(coordinate)),
            self.index.package_metadata(&entry.id),
        );

        let branches = branches.unwrap_or_else(|error| {
            issues.push(format!("{}: branch listing failed: {error}", entry.id));
            degraded = true;
            Vec::new()
        });
        let tags = tags.unwrap_or_else(|error| {
            issues.push(format!("{}: tag listing failed: {error}", entry.id));
            degraded = true;
            Vec::new()
        });
        let metadata = match metadata {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                issues.push(format!(
                    "{}: repository metadata unavailable: {error}",
                    entry.id
                ));
                degraded = true;
                None
            }
        };
        let packument = match packument {
            Ok(packument) => packument,
            Err(error) => {
                issues.push(format!("{}: package index unavailable: {error}", entry.id));
                degraded = true;
                None
            }
        };

        let index_info = packument.map(|packument| {
            PackageIndexInfo::from_packument(
                &entry.id,
                &packument,
                &self.settings.core_package,
                self.settings.epochs(),
            )
        });

        let candidates = candidate_branches(
            metadata
                .as_ref()
                .and_then(|metadata| metadata.default_branch.as_deref()),
            &self.settings.branch_candidates,
            &branches,
        );
        let (manifests, manifest_issues) =
            resolve_branch_manifests(self.host.as_ref(), coordinate, &candidates, &self.settings)
                .await;
        if !manifest_issues.is_empty() {
            degraded = true;
            issues.extend(manifest_issues);
        }

        let verdict = aggregate(&manifests, index_info.as_ref(), &self.settings);
        issues.extend(verdict.issues.iter().cloned());

        let tag_info = TagInfo::from_tags(&tags, self.settings.epochs());
        let registry_entry = RegistryEntry::assemble(
            coordinate,
            metadata,
            &tag_info,
            index_info.as_ref(),
            &verdict,
            &manifests,
        );

        let result = if degraded {
            ProcessingResult::Degraded {
                id: entry.id.clone(),
                issues,
            }
        } else {
            ProcessingResult::Resolved {
                id: entry.id.clone(),
                issues,
            }
        };
        (registry_entry, result)
    }
}
