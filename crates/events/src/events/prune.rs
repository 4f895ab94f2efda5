use serde::{Deserialize, Serialize};

/// Disk-to-catalog orphan detection events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PruneEvent {
    Started { root: String, destructive: bool },

    OrphanFound { path: String },

    OrphanRemoved { path: String },

    Completed {
        scanned: usize,
        orphans: usize,
        removed: usize,
    },
}
