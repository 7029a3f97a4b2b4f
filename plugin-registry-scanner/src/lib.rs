#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod epoch;
pub mod github;
pub mod manifest;
pub mod npm;
pub mod rate_limit;
pub mod report;
pub mod retry;
pub mod runner;
pub mod summary;
pub mod versions;

pub use aggregate::{
    aggregate, candidate_branches, resolve_branch_manifests, CompatibilityVerdict,
    IndexEvidence, PackageIndexInfo, SupportSource, TagInfo,
};
pub use catalog::{Catalog, CatalogEntry, CatalogError, RepoCoordinate, SkippedEntry};
pub use config::{load_settings, ConfigError, ScannerSettings};
pub use epoch::{CoreRange, Epoch};
pub use github::{GitHubHost, HostError, RepoMetadata, RepositoryHost};
pub use manifest::{resolve_manifest, ManifestInfo, PackageManifest};
pub use npm::{IndexError, NpmPackument, NpmRegistry, PackageIndex};
pub use rate_limit::{wait_if_needed, RateLimitInfo};
pub use report::{GitInfo, NpmInfo, RegistryEntry, Report};
pub use retry::{with_retries, RetryPolicy};
pub use runner::{RunOutput, Runner, RunnerConfig, RunnerError};
pub use summary::{ProcessingResult, RunSummary};
pub use versions::{parse_loose, select_best, Selected};
