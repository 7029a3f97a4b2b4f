//! Plugin catalog loading.
//!
//! The catalog is a flat JSON object mapping a package identifier (which
//! doubles as the npm package name) to a `github:<owner>/<repo>` repository
//! reference. Entries that do not fit that shape are dropped with a logged
//! reason, never an error.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing catalog file.
    #[error("Missing catalog file: {path}")]
    MissingFile { path: String },

    /// Failed to read the catalog file.
    #[error("Failed to read catalog '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the catalog JSON.
    #[error("Failed to parse catalog '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The catalog document is not a JSON object.
    #[error("Catalog '{path}' must be a JSON object of identifier to repository reference")]
    NotAnObject { path: String },
}

/// A repository coordinate parsed from a `github:<owner>/<repo>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinate {
    /// Parses a catalog repository reference. Only the exact
    /// `github:<owner>/<repo>` form with non-empty parts is accepted.
    #[must_use]
    pub fn parse(reference: &str) -> Option<Self> {
        let url = Url::parse(reference.trim()).ok()?;
        if url.scheme() != "github" {
            return None;
        }
        let (owner, name) = url.path().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(RepoCoordinate {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One usable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub coordinate: RepoCoordinate,
}

/// An entry dropped during loading, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub id: String,
    pub reason: String,
}

/// A loaded catalog: usable entries in key order plus the entries that were
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl Catalog {
    /// Loads the catalog from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the catalog JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid JSON,
    /// or not a JSON object. Individual malformed entries are skipped, not
    /// errors.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        info!(path = %path.display(), "Loading plugin catalog");

        if !path.exists() {
            return Err(CatalogError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let document: Value =
            serde_json::from_str(&raw).map_err(|e| CatalogError::JsonError {
                path: path.display().to_string(),
                source: e,
            })?;

        let Some(object) = document.as_object() else {
            return Err(CatalogError::NotAnObject {
                path: path.display().to_string(),
            });
        };

        let catalog = Self::from_entries(object);
        info!(
            entries = catalog.entries.len(),
            skipped = catalog.skipped.len(),
            "Loaded plugin catalog"
        );
        Ok(catalog)
    }

    /// Builds a catalog from an already-parsed JSON object, filtering
    /// entries that are not usable.
    #[must_use]
    pub fn from_entries(document: &serde_json::Map<String, Value>) -> Self {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for (id, value) in document {
            if id.trim().is_empty() {
                warn!("Skipping catalog entry with an empty identifier");
                skipped.push(SkippedEntry {
                    id: id.clone(),
                    reason: "empty identifier".to_string(),
                });
                continue;
            }

            let Some(reference) = value.as_str() else {
                warn!(id = %id, "Skipping catalog entry: repository reference is not a string");
                skipped.push(SkippedEntry {
                    id: id.clone(),
                    reason: "repository reference is not a string".to_string(),
                });
                continue;
            };

            match RepoCoordinate::parse(reference) {
                Some(coordinate) => entries.push(CatalogEntry {
                    id: id.clone(),
                    coordinate,
                }),
                None => {
                    warn!(
                        id = %id,
                        reference = %reference,
                        "Skipping catalog entry: unrecognized repository reference"
                    );
                    skipped.push(SkippedEntry {
                        id: id.clone(),
                        reason: format!("unrecognized repository reference '{reference}'"),
                    });
                }
            }
        }

        Catalog { entries, skipped }
    }
}
