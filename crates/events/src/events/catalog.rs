use serde::{Deserialize, Serialize};

/// Package catalog construction events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// A catalog file is being parsed
    Loading { path: String, supplementary: bool },

    /// A catalog file was merged
    Loaded {
        path: String,
        records: usize,
        added: usize,
    },

    /// A location appears twice within one catalog file
    DuplicateLocation { path: String, catalog: String },

    /// A supplementary catalog disagrees with an earlier record for the same path
    ChecksumDisagreement {
        path: String,
        kept: String,
        ignored: String,
        catalog: String,
    },

    /// Catalog is complete and frozen
    Built { entries: usize, sources: usize },
}
