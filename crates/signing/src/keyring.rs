//! Trusted keyring construction

use std::io::Cursor;
use std::path::{Path, PathBuf};

use mirrorcheck_config::constants::KEY_FILE_SUFFIX;
use mirrorcheck_errors::{Error, SigningError};
use pgp::packet::{PublicKey, PublicSubkey, Signature, SignatureType};
use pgp::types::PublicKeyTrait;
use pgp::{Deserializable, SignedPublicKey, StandaloneSignature};
use walkdir::WalkDir;

use crate::verify::KeyIdentifier;

#[derive(Debug, Clone)]
enum VerifyingKey {
    Primary(PublicKey),
    Subkey(PublicSubkey),
}

/// One public key (primary or subkey) trusted to sign repository metadata
#[derive(Debug, Clone)]
pub struct TrustedKey {
    id: KeyIdentifier,
    can_sign: bool,
    key: VerifyingKey,
    origin: PathBuf,
}

impl TrustedKey {
    #[must_use]
    pub fn id(&self) -> KeyIdentifier {
        self.id
    }

    /// Whether the key's self-signatures allow signing data
    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.can_sign
    }

    #[must_use]
    pub fn is_subkey(&self) -> bool {
        matches!(self.key, VerifyingKey::Subkey(_))
    }

    /// File the key was loaded from
    #[must_use]
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub(crate) fn verify(
        &self,
        signature: &StandaloneSignature,
        content: &[u8],
    ) -> pgp::errors::Result<()> {
        match &self.key {
            VerifyingKey::Primary(key) => signature.verify(key, content),
            VerifyingKey::Subkey(key) => signature.verify(key, content),
        }
    }
}

/// A key file that contributed to the keyring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySource {
    pub path: PathBuf,
    pub keys: usize,
}

/// Immutable set of trusted keys, built once per run
#[derive(Debug, Clone, Default)]
pub struct TrustedKeyring {
    keys: Vec<TrustedKey>,
    sources: Vec<KeySource>,
}

impl TrustedKeyring {
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TrustedKey> {
        self.keys.iter()
    }

    #[must_use]
    pub fn sources(&self) -> &[KeySource] {
        &self.sources
    }

    /// Number of keys allowed to sign data
    #[must_use]
    pub fn signing_key_count(&self) -> usize {
        self.keys.iter().filter(|k| k.can_sign).count()
    }

    /// Signing-capable keys carrying `id`, in load order
    pub fn signing_keys(&self, id: KeyIdentifier) -> impl Iterator<Item = &TrustedKey> {
        self.keys.iter().filter(move |k| k.can_sign && k.id == id)
    }

    fn extend_from_file(&mut self, path: &Path) -> Result<(), Error> {
        let bytes = std::fs::read(path).map_err(|e| SigningError::InvalidKeyFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let parsed = parse_public_keys(&bytes).map_err(|e| SigningError::InvalidKeyFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if parsed.is_empty() {
            return Err(SigningError::InvalidKeyFile {
                path: path.display().to_string(),
                reason: "no public keys found".to_string(),
            }
            .into());
        }

        let before = self.keys.len();
        for key in &parsed {
            self.keys.extend(trusted_keys_of(key, path));
        }
        self.sources.push(KeySource {
            path: path.to_path_buf(),
            keys: self.keys.len() - before,
        });
        Ok(())
    }
}

/// Load the trusted keyring from a key file or a directory of key files
///
/// A directory is walked recursively; every file ending in `.gpg` is loaded
/// in file name order. Both binary and armored key files are accepted.
///
/// # Errors
/// Returns an error if the source does not exist, any key file fails to
/// parse, or no signing-capable key remains after loading.
pub fn load_keyring(source: &Path) -> Result<TrustedKeyring, Error> {
    let metadata = std::fs::metadata(source).map_err(|_| SigningError::KeyringNotFound {
        path: source.display().to_string(),
    })?;

    let mut keyring = TrustedKeyring::default();
    if metadata.is_dir() {
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| SigningError::InvalidKeyFile {
                path: source.display().to_string(),
                reason: e.to_string(),
            })?;
            let is_key_file = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .ends_with(KEY_FILE_SUFFIX);
            if is_key_file {
                keyring.extend_from_file(entry.path())?;
            }
        }
    } else {
        keyring.extend_from_file(source)?;
    }

    if keyring.signing_key_count() == 0 {
        return Err(SigningError::EmptyKeyring {
            source_path: source.display().to_string(),
        }
        .into());
    }
    Ok(keyring)
}

fn parse_public_keys(bytes: &[u8]) -> pgp::errors::Result<Vec<SignedPublicKey>> {
    let (keys, _headers) = SignedPublicKey::from_reader_many(Cursor::new(bytes))?;
    keys.collect()
}

/// Flatten a certificate into its usable primary key and subkeys.
/// Revoked keys are dropped.
fn trusted_keys_of(key: &SignedPublicKey, origin: &Path) -> Vec<TrustedKey> {
    let mut out = Vec::new();
    if !key.details.revocation_signatures.is_empty() {
        return out;
    }

    let self_signatures = key
        .details
        .users
        .iter()
        .flat_map(|user| user.signatures.iter())
        .chain(key.details.direct_signatures.iter());
    if let Some(id) = KeyIdentifier::from_bytes(key.primary_key.key_id().as_ref()) {
        out.push(TrustedKey {
            id,
            can_sign: may_sign(self_signatures),
            key: VerifyingKey::Primary(key.primary_key.clone()),
            origin: origin.to_path_buf(),
        });
    }

    for subkey in &key.public_subkeys {
        let revoked = subkey
            .signatures
            .iter()
            .any(|sig| sig.typ() == SignatureType::SubkeyRevocation);
        if revoked {
            continue;
        }
        if let Some(id) = KeyIdentifier::from_bytes(subkey.key.key_id().as_ref()) {
            out.push(TrustedKey {
                id,
                can_sign: may_sign(subkey.signatures.iter()),
                key: VerifyingKey::Subkey(subkey.key.clone()),
                origin: origin.to_path_buf(),
            });
        }
    }
    out
}

/// A key may sign when a self-signature grants the sign flag, or when no
/// self-signature declares usage flags at all.
fn may_sign<'a>(signatures: impl Iterator<Item = &'a Signature>) -> bool {
    let mut declared = false;
    for sig in signatures {
        let flags = sig.key_flags();
        if flags.sign() {
            return true;
        }
        declared |= flags.certify()
            || flags.encrypt_comms()
            || flags.encrypt_storage()
            || flags.authentication();
    }
    !declared
}
