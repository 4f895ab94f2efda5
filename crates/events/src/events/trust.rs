use serde::{Deserialize, Serialize};

/// Keyring and signature events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrustEvent {
    /// One key file was read into the keyring
    KeyFileLoaded { path: String, keys: usize },

    /// Keyring construction finished
    KeyringLoaded {
        source: String,
        keys: usize,
        signing_keys: usize,
    },

    /// Signature checks are switched off for this run
    TrustDisabled { reason: String },

    /// The index signature was decoded and is about to be checked
    SignatureFound {
        signature_path: String,
        issuer: String,
        signed_at: Option<String>,
    },

    /// More than one signing-capable key carries the issuer id
    AmbiguousSigner { issuer: String, candidates: usize },

    /// The index signature verified against a trusted key
    SignatureVerified {
        signature_path: String,
        issuer: String,
        signed_at: Option<String>,
    },
}
