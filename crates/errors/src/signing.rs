//! Signing and keyring error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("signature has no issuer")]
    MissingIssuer,

    #[error("no matching public key found for key id {key_id}")]
    NoMatchingKey { key_id: String },

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("invalid public key file {path}: {reason}")]
    InvalidKeyFile { path: String, reason: String },

    #[error("keyring source not found: {path}")]
    KeyringNotFound { path: String },

    #[error("no usable signing keys loaded from {source_path}")]
    EmptyKeyring { source_path: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoMatchingKey { .. } => {
                Some("Add the repository's signing key to the keyring, or pass --insecure to skip signature checks.")
            }
            Self::EmptyKeyring { .. } | Self::KeyringNotFound { .. } => {
                Some("Point --keyring at a .gpg file or a directory containing .gpg key files.")
            }
            Self::InvalidKeyFile { .. } => Some("Remove or replace the unreadable key file."),
            Self::MissingIssuer | Self::InvalidSignatureFormat(_) => {
                Some("The detached signature next to repomd.xml is malformed; resync the repodata.")
            }
            Self::VerificationFailed { .. } => {
                Some("repomd.xml does not match its signature; the metadata may have been altered.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::VerificationFailed { .. } => "signing.verification_failed",
            Self::MissingIssuer => "signing.missing_issuer",
            Self::NoMatchingKey { .. } => "signing.no_matching_key",
            Self::InvalidSignatureFormat(_) => "signing.invalid_signature",
            Self::InvalidKeyFile { .. } => "signing.invalid_key_file",
            Self::KeyringNotFound { .. } => "signing.keyring_not_found",
            Self::EmptyKeyring { .. } => "signing.empty_keyring",
        };
        Some(code)
    }
}
