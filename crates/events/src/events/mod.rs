use serde::{Deserialize, Serialize};

// Declare all domain modules
pub mod catalog;
pub mod general;
pub mod metadata;
pub mod prune;
pub mod trust;
pub mod verify;

// Re-export all domain events
pub use catalog::*;
pub use general::*;
pub use metadata::*;
pub use prune::*;
pub use trust::*;
pub use verify::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Keyring and signature events
    Trust(TrustEvent),

    /// Index resolution events
    Metadata(MetadataEvent),

    /// Catalog construction events
    Catalog(CatalogEvent),

    /// Checksum verification events
    Verify(VerifyEvent),

    /// Orphan detection events
    Prune(PruneEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            // Error-level events
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Metadata(MetadataEvent::EntryMismatch { .. })
            | Self::Verify(VerifyEvent::FileFailed { .. }) => Level::ERROR,

            // Warning-level events
            Self::General(GeneralEvent::Warning { .. })
            | Self::Trust(TrustEvent::TrustDisabled { .. } | TrustEvent::AmbiguousSigner { .. })
            | Self::Catalog(
                CatalogEvent::ChecksumDisagreement { .. } | CatalogEvent::DuplicateLocation { .. },
            ) => Level::WARN,

            // Debug-level events (per-file progress, internal state)
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Trust(TrustEvent::KeyFileLoaded { .. })
            | Self::Metadata(MetadataEvent::EntryChecking { .. } | MetadataEvent::IndexLoading { .. })
            | Self::Catalog(CatalogEvent::Loading { .. })
            | Self::Verify(VerifyEvent::FilePassed { .. }) => Level::DEBUG,

            // Default to INFO for most events
            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "mirrorcheck::events::general",
            Self::Trust(_) => "mirrorcheck::events::trust",
            Self::Metadata(_) => "mirrorcheck::events::metadata",
            Self::Catalog(_) => "mirrorcheck::events::catalog",
            Self::Verify(_) => "mirrorcheck::events::verify",
            Self::Prune(_) => "mirrorcheck::events::prune",
        }
    }
}
