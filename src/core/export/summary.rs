//! Export summary and reporting

use std::fmt;
use std::time::Duration;

/// Summary of one export cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    /// Unexported transactions fetched for rendering
    pub fetched: usize,

    /// Metadata patches the renderer returned
    pub rendered: usize,

    /// Transactions marked as written to the ledger file
    pub marked: usize,

    /// Patches left unapplied: unknown, ambiguous or unreadable records
    pub missing: usize,

    /// Transaction IDs of stored records that could not be decoded
    pub malformed: Vec<String>,

    /// Duration of the cycle
    pub duration: Duration,
}

impl ExportSummary {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether every fetched record was rendered and marked
    pub fn is_complete(&self) -> bool {
        self.malformed.is_empty() && self.missing == 0 && self.marked == self.fetched
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched {}, marked {}, missing {}, malformed {} in {:.2}s",
            self.fetched,
            self.marked,
            self.missing,
            self.malformed.len(),
            self.duration.as_secs_f64()
        )
    }
}
