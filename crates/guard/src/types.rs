//! Result types of the reconcile and prune scans

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use mirrorcheck_index::ReportLine;

/// Per-file checksum outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// The file was read and its digest differs from the declared one
    Mismatch,
    /// The file could not be opened or hashed, or the declared checksum is unusable
    Unreadable,
}

impl Outcome {
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Mismatch => "mismatch",
            Self::Unreadable => "unreadable",
        };
        f.write_str(s)
    }
}

/// Checksum result for one catalog record
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Mirror-relative path
    pub path: String,
    /// Declared algorithm, checksum and size, as they appear in the report
    pub expected: ReportLine,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

/// Aggregate of a reconcile pass, ordered by path
#[derive(Debug, Clone, Default)]
pub struct ReconcileSummary {
    pub results: Vec<VerificationResult>,
    pub failed: usize,
    pub duration: Duration,
}

impl ReconcileSummary {
    #[must_use]
    pub fn checked(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.checked() - self.failed
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.outcome.is_ok())
    }

    /// Report lines for every failed record, in path order
    pub fn report_lines(&self) -> impl Iterator<Item = &ReportLine> {
        self.failures().map(|r| &r.expected)
    }
}

/// What the prune pass does with an orphan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneAction {
    /// List orphans only
    Report,
    /// Remove orphans from disk
    Delete,
}

/// Classification of a package file found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneDecision {
    Referenced,
    Orphan,
}

/// One package file seen by the prune walk
#[derive(Debug, Clone)]
pub struct PruneEntry {
    /// Mirror-relative path, the catalog key it was looked up by
    pub path: String,
    pub disk_path: PathBuf,
    pub decision: PruneDecision,
}

/// Aggregate of a prune pass, in walk order
#[derive(Debug, Clone, Default)]
pub struct PruneSummary {
    pub entries: Vec<PruneEntry>,
    /// Orphans deleted from disk
    pub removed: Vec<String>,
    /// Orphans that could not be deleted, with the reason
    pub remove_failures: Vec<(String, String)>,
}

impl PruneSummary {
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.entries.len()
    }

    pub fn orphans(&self) -> impl Iterator<Item = &PruneEntry> {
        self.entries
            .iter()
            .filter(|e| e.decision == PruneDecision::Orphan)
    }

    #[must_use]
    pub fn orphan_count(&self) -> usize {
        self.orphans().count()
    }
}
