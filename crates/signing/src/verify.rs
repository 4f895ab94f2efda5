//! Detached signature verification

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mirrorcheck_errors::{Error, SigningError};
use pgp::packet::Signature;
use pgp::{Deserializable, StandaloneSignature};
use serde::{Deserialize, Serialize};

use crate::TrustedKeyring;

/// 64-bit OpenPGP key id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyIdentifier(u64);

impl KeyIdentifier {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Build from the 8 big-endian bytes of a key id
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = bytes.try_into().ok()?;
        Some(Self(u64::from_be_bytes(bytes)))
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0.to_be_bytes()))
    }
}

impl FromStr for KeyIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed)
            .map_err(|e| Error::internal(format!("invalid key id {s}: {e}")))?;
        Self::from_bytes(&bytes).ok_or_else(|| Error::internal(format!("invalid key id {s}")))
    }
}

/// What a detached signature claims about itself, before any key is consulted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAssertion {
    pub issuer: KeyIdentifier,
    pub created: Option<DateTime<Utc>>,
    /// Declared digest algorithm
    pub digest: String,
}

impl SignatureAssertion {
    /// Decode the single signature packet of an armored detached signature
    ///
    /// # Errors
    /// Returns an error if the armor or packet cannot be decoded, the armor
    /// holds other than exactly one signature, or the issuer is missing.
    pub fn decode(armored: &str) -> Result<Self, Error> {
        decode(armored).map(|(assertion, _)| assertion)
    }
}

/// Outcome of a successful signature check
#[derive(Debug, Clone)]
pub struct VerifiedSignature {
    pub assertion: SignatureAssertion,
    /// File the verifying key came from
    pub key_origin: PathBuf,
    /// Signing-capable keys in the keyring sharing the issuer id
    pub candidates: usize,
}

impl VerifiedSignature {
    /// More than one trusted key carries the issuer id
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

fn decode(armored: &str) -> Result<(SignatureAssertion, StandaloneSignature), Error> {
    let (signatures, _headers) =
        StandaloneSignature::from_armor_many(Cursor::new(armored.as_bytes()))
            .map_err(|e| SigningError::InvalidSignatureFormat(e.to_string()))?;
    let mut signatures = signatures
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SigningError::InvalidSignatureFormat(e.to_string()))?;

    let signature = match signatures.len() {
        1 => signatures.remove(0),
        n => {
            return Err(SigningError::InvalidSignatureFormat(format!(
                "expected exactly one signature packet, found {n}"
            ))
            .into())
        }
    };

    let issuer = issuer_of(&signature.signature).ok_or(SigningError::MissingIssuer)?;

    let assertion = SignatureAssertion {
        issuer,
        created: signature
            .signature
            .created()
            .copied()
            .or(signature.signature.config.created().copied()),
        digest: format!("{:?}", signature.signature.config.hash_alg),
    };
    Ok((assertion, signature))
}

/// Key id the signature names as its issuer
///
/// Legacy v3 packets carry the id in the packet body, v4 packets in an
/// Issuer subpacket. A v4 packet with only an IssuerFingerprint names the
/// key by the low 64 bits of the fingerprint.
fn issuer_of(signature: &Signature) -> Option<KeyIdentifier> {
    signature
        .config
        .issuer()
        .into_iter()
        .chain(signature.issuer())
        .find_map(|id| KeyIdentifier::from_bytes(id.as_ref()))
        .or_else(|| {
            signature.issuer_fingerprint().into_iter().find_map(|fingerprint| {
                let bytes: &[u8] = fingerprint.as_bytes();
                match bytes.len() {
                    20 => KeyIdentifier::from_bytes(&bytes[12..]),
                    _ => None,
                }
            })
        })
}

/// Verify `content` against an armored detached signature
///
/// The issuer must match a signing-capable key in `keyring`. When several
/// keys share the issuer id each is tried in load order and the first that
/// verifies wins; the caller can see the ambiguity in
/// [`VerifiedSignature::candidates`].
///
/// # Errors
/// Returns an error if the signature cannot be decoded, has no issuer, no
/// trusted key matches the issuer, or no matching key verifies the content.
pub fn verify_detached(
    content: &[u8],
    armored_signature: &str,
    keyring: &TrustedKeyring,
) -> Result<VerifiedSignature, Error> {
    let (assertion, signature) = decode(armored_signature)?;

    let candidates: Vec<_> = keyring.signing_keys(assertion.issuer).collect();
    if candidates.is_empty() {
        return Err(SigningError::NoMatchingKey {
            key_id: assertion.issuer.to_string(),
        }
        .into());
    }

    let mut last_error = None;
    for key in &candidates {
        match key.verify(&signature, content) {
            Ok(()) => {
                return Ok(VerifiedSignature {
                    assertion,
                    key_origin: key.origin().to_path_buf(),
                    candidates: candidates.len(),
                })
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(SigningError::VerificationFailed {
        reason: last_error.unwrap_or_else(|| "no key verified the signature".to_string()),
    }
    .into())
}
