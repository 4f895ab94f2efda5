//! Metadata index resolution
//!
//! Loads `repomd.xml`, gates it on the detached signature when trust is
//! enforced, checks every listed metadata file and locates the primary
//! catalog.

use std::path::PathBuf;

use mirrorcheck_config::constants::PRIMARY_TYPE;
use mirrorcheck_errors::{Error, MetadataError, SigningError};
use mirrorcheck_events::{AppEvent, EventEmitter, MetadataEvent, TrustEvent};
use mirrorcheck_hash::Checksum;
use mirrorcheck_signing::{verify_detached, SignatureAssertion, TrustPolicy, VerifiedSignature};

use crate::models::{RepoMd, RepoMdData};
use crate::{IndexLocation, ReportLine};

/// One `<data>` row of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Role tag, e.g. `primary` or `filelists`
    pub kind: String,
    pub href: String,
    pub algorithm: String,
    pub checksum: String,
    pub size: u64,
}

impl MetadataEntry {
    fn from_xml(data: RepoMdData) -> Self {
        Self {
            kind: data.kind,
            href: data.location.href,
            algorithm: data.checksum.algorithm,
            checksum: data.checksum.value.trim().to_string(),
            size: data.size,
        }
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.kind == PRIMARY_TYPE
    }
}

/// The verified index with its primary catalog located
#[derive(Debug, Clone)]
pub struct ResolvedIndex {
    pub location: IndexLocation,
    pub revision: Option<String>,
    pub entries: Vec<MetadataEntry>,
    /// The verified entry naming the primary catalog
    pub primary: MetadataEntry,
    pub primary_path: PathBuf,
    /// Metadata files that failed their checksum, in index order
    pub failures: Vec<ReportLine>,
    /// Present when trust was enforced
    pub signature: Option<VerifiedSignature>,
}

/// Load, authenticate and check the repository index
///
/// A metadata file failing its checksum is recorded in
/// [`ResolvedIndex::failures`] and resolution continues.
///
/// # Errors
/// Returns an error if the index cannot be read or parsed, the signature
/// check fails under an enforced policy, or no primary entry passes its
/// checksum.
pub async fn resolve_index(
    location: &IndexLocation,
    policy: &TrustPolicy,
    emitter: &impl EventEmitter,
) -> Result<ResolvedIndex, Error> {
    let index_path = location.index_path();
    emitter.emit(AppEvent::Metadata(MetadataEvent::IndexLoading {
        path: index_path.display().to_string(),
    }));

    let content = tokio::fs::read(&index_path)
        .await
        .map_err(|e| MetadataError::Unreadable {
            path: index_path.display().to_string(),
            message: e.to_string(),
        })?;

    let signature = match policy {
        TrustPolicy::Enforced(keyring) => {
            Some(authenticate(location, &content, keyring, emitter).await?)
        }
        TrustPolicy::Disabled => None,
    };

    let text = String::from_utf8(content).map_err(|e| MetadataError::ParseError {
        path: index_path.display().to_string(),
        message: e.to_string(),
    })?;
    let repomd: RepoMd = quick_xml::de::from_str(&text).map_err(|e| MetadataError::ParseError {
        path: index_path.display().to_string(),
        message: e.to_string(),
    })?;

    let entries: Vec<MetadataEntry> = repomd.data.into_iter().map(MetadataEntry::from_xml).collect();
    emitter.emit(AppEvent::Metadata(MetadataEvent::IndexLoaded {
        path: index_path.display().to_string(),
        entries: entries.len(),
        revision: repomd.revision.clone(),
    }));

    let mut failures = Vec::new();
    let mut primary: Option<MetadataEntry> = None;
    for entry in &entries {
        let relative = location.mirror_relative(&entry.href);
        emitter.emit(AppEvent::Metadata(MetadataEvent::EntryChecking {
            kind: entry.kind.clone(),
            path: relative.clone(),
        }));

        if let Err(reason) = check_entry(location, entry).await {
            emitter.emit(AppEvent::Metadata(MetadataEvent::EntryMismatch {
                kind: entry.kind.clone(),
                path: relative.clone(),
                reason,
            }));
            failures.push(ReportLine {
                algorithm: entry.algorithm.clone(),
                checksum: entry.checksum.clone(),
                size: entry.size,
                path: relative,
            });
            continue;
        }

        if entry.is_primary() {
            if primary.is_some() {
                emitter.emit_warning_with_context(
                    "index lists more than one primary catalog, keeping the first",
                    relative,
                );
            } else {
                primary = Some(entry.clone());
            }
        }
    }

    let primary = primary.ok_or_else(|| MetadataError::PrimaryNotFound {
        index: index_path.display().to_string(),
    })?;
    let primary_path = location.resolve(&primary.href);
    emitter.emit(AppEvent::Metadata(MetadataEvent::PrimaryLocated {
        path: primary_path.display().to_string(),
    }));

    Ok(ResolvedIndex {
        location: location.clone(),
        revision: repomd.revision,
        entries,
        primary,
        primary_path,
        failures,
        signature,
    })
}

async fn authenticate(
    location: &IndexLocation,
    content: &[u8],
    keyring: &mirrorcheck_signing::TrustedKeyring,
    emitter: &impl EventEmitter,
) -> Result<VerifiedSignature, Error> {
    let signature_path = location.signature_path();
    let armored = tokio::fs::read_to_string(&signature_path)
        .await
        .map_err(|e| SigningError::InvalidSignatureFormat(format!(
            "{}: {e}",
            signature_path.display()
        )))?;

    let assertion = SignatureAssertion::decode(&armored)?;
    emitter.emit(AppEvent::Trust(TrustEvent::SignatureFound {
        signature_path: signature_path.display().to_string(),
        issuer: assertion.issuer.to_string(),
        signed_at: assertion.created.map(|t| t.to_rfc3339()),
    }));

    let verified = verify_detached(content, &armored, keyring)?;
    if verified.is_ambiguous() {
        emitter.emit(AppEvent::Trust(TrustEvent::AmbiguousSigner {
            issuer: verified.assertion.issuer.to_string(),
            candidates: verified.candidates,
        }));
    }
    emitter.emit(AppEvent::Trust(TrustEvent::SignatureVerified {
        signature_path: signature_path.display().to_string(),
        issuer: verified.assertion.issuer.to_string(),
        signed_at: verified.assertion.created.map(|t| t.to_rfc3339()),
    }));
    Ok(verified)
}

/// Check one metadata file against its declared checksum. The error is a
/// human-readable reason.
async fn check_entry(location: &IndexLocation, entry: &MetadataEntry) -> Result<(), String> {
    let expected = Checksum::parse(&entry.algorithm, &entry.checksum).map_err(|e| e.to_string())?;
    let path = location.resolve(&entry.href);
    let actual = Checksum::hash_file(expected.algorithm(), &path)
        .await
        .map_err(|e| e.to_string())?;
    if actual == expected {
        Ok(())
    } else {
        Err(format!("checksum mismatch: got {actual}"))
    }
}
