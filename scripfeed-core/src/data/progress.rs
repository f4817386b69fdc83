//! Progress log entries and live progress callbacks.

use super::provider::FetchError;
use crate::domain::{DateChunk, SecurityId};
use std::fmt;

/// One line of the progress log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEntry {
    ChunkCompleted {
        isin: String,
        chunk: DateChunk,
        records: usize,
    },
    /// The chunk stopped early; `records` were already written for it.
    ChunkFailed {
        isin: String,
        chunk: DateChunk,
        records: usize,
        error: String,
    },
    SecurityCompleted {
        isin: String,
        records: usize,
    },
    /// `records` were written for the security before the failure.
    SecurityFailed {
        isin: String,
        records: usize,
        error: String,
    },
}

impl ProgressEntry {
    pub fn isin(&self) -> &str {
        match self {
            ProgressEntry::ChunkCompleted { isin, .. }
            | ProgressEntry::ChunkFailed { isin, .. }
            | ProgressEntry::SecurityCompleted { isin, .. }
            | ProgressEntry::SecurityFailed { isin, .. } => isin,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProgressEntry::ChunkFailed { .. } | ProgressEntry::SecurityFailed { .. }
        )
    }
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEntry::ChunkCompleted {
                isin,
                chunk,
                records,
            } => write!(f, "{isin} {chunk}: {records} records"),
            ProgressEntry::ChunkFailed {
                isin,
                chunk,
                records,
                error,
            } => write!(f, "{isin} {chunk}: FAILED after {records} records: {error}"),
            ProgressEntry::SecurityCompleted { isin, records } => {
                write!(f, "{isin}: done, {records} records")
            }
            ProgressEntry::SecurityFailed {
                isin,
                records,
                error,
            } => write!(f, "{isin}: FAILED after {records} records: {error}"),
        }
    }
}

/// Live callbacks for a fetch run.
pub trait FetchProgress {
    /// Called before any I/O for a security.
    fn on_security_start(&self, security: &SecurityId, index: usize, total: usize);

    /// Called after each page has been written.
    fn on_page(&self, security: &SecurityId, chunk: &DateChunk, page: u32, records: usize);

    /// Called for every entry as it is appended to the progress log.
    fn on_entry(&self, entry: &ProgressEntry);
}

/// Forwards progress to `tracing`.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_security_start(&self, security: &SecurityId, index: usize, total: usize) {
        tracing::info!("[{}/{}] Fetching {security}", index + 1, total);
    }

    fn on_page(&self, security: &SecurityId, chunk: &DateChunk, page: u32, records: usize) {
        tracing::debug!(isin = %security.isin, %chunk, page, records, "page written");
    }

    fn on_entry(&self, entry: &ProgressEntry) {
        if entry.is_failure() {
            tracing::warn!("{entry}");
        } else {
            tracing::info!("{entry}");
        }
    }
}

/// Discards progress; the returned log still records everything.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_security_start(&self, _security: &SecurityId, _index: usize, _total: usize) {}

    fn on_page(&self, _security: &SecurityId, _chunk: &DateChunk, _page: u32, _records: usize) {}

    fn on_entry(&self, _entry: &ProgressEntry) {}
}

/// Final state of one security after a run.
#[derive(Debug)]
pub struct SecurityOutcome {
    pub security: SecurityId,
    pub records: usize,
    pub error: Option<FetchError>,
}

impl SecurityOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a run produced: the ordered progress log plus one outcome per
/// security.
#[derive(Debug, Default)]
pub struct RunReport {
    pub log: Vec<ProgressEntry>,
    pub outcomes: Vec<SecurityOutcome>,
}

impl RunReport {
    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.records).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SecurityOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(SecurityOutcome::succeeded)
    }

    /// The progress log rendered one line per entry.
    pub fn lines(&self) -> Vec<String> {
        self.log.iter().map(ToString::to_string).collect()
    }
}
