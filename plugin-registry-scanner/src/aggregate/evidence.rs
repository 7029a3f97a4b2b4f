//! Per-epoch evidence derived from tags and the package index.

use std::collections::BTreeMap;

use crate::epoch::Epoch;
use crate::npm::NpmPackument;
use crate::versions::{select_best, Selected};

/// Best tag per epoch, original tag text preserved.
///
/// Tags feed the report's display versions only; they never mark an epoch
/// supported on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagInfo {
    pub per_epoch: BTreeMap<Epoch, String>,
}

impl TagInfo {
    /// Selects the best tag for each epoch from raw tag names.
    #[must_use]
    pub fn from_tags(tags: &[String], epochs: impl Iterator<Item = Epoch>) -> Self {
        let per_epoch = epochs
            .filter_map(|epoch| {
                select_best(tags, epoch).map(|selected| (epoch, selected.raw))
            })
            .collect();
        TagInfo { per_epoch }
    }
}

/// The best published version of one epoch and the core range it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEvidence {
    pub version: Selected,
    pub core_range: Option<String>,
}

/// Package-index evidence per epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndexInfo {
    pub package: String,
    pub per_epoch: BTreeMap<Epoch, IndexEvidence>,
}

impl PackageIndexInfo {
    /// Folds a packument into per-epoch evidence: the best published version
    /// of each epoch plus that version's declared range for the platform
    /// core.
    #[must_use]
    pub fn from_packument(
        package: &str,
        packument: &NpmPackument,
        core_package: &str,
        epochs: impl Iterator<Item = Epoch>,
    ) -> Self {
        let published: Vec<String> = packument.versions.keys().cloned().collect();
        let per_epoch = epochs
            .filter_map(|epoch| {
                let selected = select_best(&published, epoch)?;
                let core_range = packument
                    .versions
                    .get(&selected.raw)
                    .and_then(|manifest| manifest.dependency_range(core_package))
                    .map(str::to_string);
                Some((
                    epoch,
                    IndexEvidence {
                        version: selected,
                        core_range,
                    },
                ))
            })
            .collect();
        PackageIndexInfo {
            package: package.to_string(),
            per_epoch,
        }
    }
}
