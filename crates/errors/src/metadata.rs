//! Repository metadata (index and package catalog) error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum MetadataError {
    #[error("unable to open {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("could not find primary file in {index}")]
    PrimaryNotFound { index: String },

    #[error("failed to decompress {path}: {message}")]
    DecompressionFailed { path: String, message: String },

    #[error("unsupported checksum algorithm: {algorithm}")]
    UnsupportedChecksum { algorithm: String },

    #[error("invalid {algorithm} checksum value: {value}")]
    InvalidChecksum { algorithm: String, value: String },
}

impl UserFacingError for MetadataError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unreadable { .. } => Some("Check --path, --repo and --repodata point at the mirror."),
            Self::ParseError { .. } | Self::DecompressionFailed { .. } => {
                Some("The metadata file is damaged; resync the repodata directory.")
            }
            Self::PrimaryNotFound { .. } => {
                Some("The primary catalog is missing or failed its checksum; resync the repodata directory.")
            }
            Self::UnsupportedChecksum { .. } | Self::InvalidChecksum { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unreadable { .. } => "metadata.unreadable",
            Self::ParseError { .. } => "metadata.parse_error",
            Self::PrimaryNotFound { .. } => "metadata.primary_not_found",
            Self::DecompressionFailed { .. } => "metadata.decompression_failed",
            Self::UnsupportedChecksum { .. } => "metadata.unsupported_checksum",
            Self::InvalidChecksum { .. } => "metadata.invalid_checksum",
        };
        Some(code)
    }
}
