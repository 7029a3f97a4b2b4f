//! Run summary types.

use super::result::ProcessingResult;

/// Summary of a complete scan.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Catalog entries that entered resolution.
    pub entries_processed: usize,

    /// Entries whose every external signal resolved.
    pub entries_resolved: usize,

    /// Entries that lost at least one signal but are still in the report.
    pub entries_degraded: usize,

    /// Catalog entries dropped before resolution.
    pub entries_skipped: usize,

    /// Every issue note recorded during the run: lost signals and evidence
    /// contradictions.
    pub issues: Vec<String>,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        match result {
            ProcessingResult::Resolved { issues, .. } => {
                self.entries_processed += 1;
                self.entries_resolved += 1;
                self.issues.extend(issues.iter().cloned());
            }
            ProcessingResult::Degraded { issues, .. } => {
                self.entries_processed += 1;
                self.entries_degraded += 1;
                self.issues.extend(issues.iter().cloned());
            }
            // The loader already logged the reason; skips are counted, not
            // re-reported as issues.
            ProcessingResult::Skipped { .. } => self.entries_skipped += 1,
        }
    }

    /// Returns true if any entry lost an external signal.
    #[must_use]
    pub fn has_degraded_entries(&self) -> bool {
        self.entries_degraded > 0
    }

    /// Returns true if every processed entry resolved cleanly.
    #[must_use]
    pub fn all_resolved(&self) -> bool {
        self.entries_degraded == 0
    }
}
