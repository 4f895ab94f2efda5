use serde::{Deserialize, Serialize};

/// Repository index (repomd) events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetadataEvent {
    /// The index file is being read
    IndexLoading { path: String },

    /// The index parsed successfully
    IndexLoaded {
        path: String,
        entries: usize,
        revision: Option<String>,
    },

    /// A metadata file listed in the index is being checked
    EntryChecking { kind: String, path: String },

    /// A metadata file failed its checksum
    EntryMismatch {
        kind: String,
        path: String,
        reason: String,
    },

    /// The primary package catalog was located
    PrimaryLocated { path: String },
}
