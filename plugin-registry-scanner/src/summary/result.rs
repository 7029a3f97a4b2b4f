//! Processing result types.

/// Outcome of resolving a single catalog entry.
#[derive(Debug, Clone)]
pub enum ProcessingResult {
    /// Every external signal resolved. Issues may still be present when the
    /// evidence contradicted itself.
    Resolved {
        /// Catalog identifier.
        id: String,
        /// Contradiction and warning notes.
        issues: Vec<String>,
    },

    /// At least one external signal was lost after retries; the entry is
    /// present in the report with the signals that survived.
    Degraded {
        /// Catalog identifier.
        id: String,
        /// What was lost, plus any contradiction notes.
        issues: Vec<String>,
    },

    /// The entry never entered resolution.
    Skipped {
        /// Catalog identifier (possibly empty).
        id: String,
        /// Reason for skipping.
        reason: String,
    },
}

impl ProcessingResult {
    /// The catalog identifier this outcome belongs to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            ProcessingResult::Resolved { id, .. }
            | ProcessingResult::Degraded { id, .. }
            | ProcessingResult::Skipped { id, .. } => id,
        }
    }
}
