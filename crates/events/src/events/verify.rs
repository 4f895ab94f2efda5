use serde::{Deserialize, Serialize};

/// Catalog-to-disk checksum verification events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerifyEvent {
    Started { files: usize, workers: usize },

    /// A single file was checked and matched
    FilePassed { path: String },

    /// A single file did not match, or could not be read
    FileFailed {
        path: String,
        outcome: String,
        reason: Option<String>,
    },

    Completed {
        checked: usize,
        failed: usize,
        duration_ms: u64,
    },
}
