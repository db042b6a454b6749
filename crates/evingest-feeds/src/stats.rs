//! Per-pipeline ingestion counters.

use std::fmt;

/// Counters kept by every pipeline while it is being drained.
///
/// `rows_read` counts data rows (CSV/Redline) or non-blank lines (JSONL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub records_emitted: usize,
    pub rows_dropped: usize,
    pub chunks_skipped: usize,
    pub lines_skipped: usize,
}

impl IngestStats {
    /// Rows that were read but did not become records.
    pub fn rows_lost(&self) -> usize {
        self.rows_read.saturating_sub(self.records_emitted)
    }
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} records emitted, {} rows dropped, {} chunks skipped, {} lines skipped",
            self.rows_read,
            self.records_emitted,
            self.rows_dropped,
            self.chunks_skipped,
            self.lines_skipped
        )
    }
}
