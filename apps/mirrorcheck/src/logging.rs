//! Structured logging integration for events
//!
//! Converts domain events into `tracing` records on stderr. The level comes
//! from [`AppEvent::log_level`]; each record carries the event's domain and a
//! few structured fields.

use mirrorcheck_events::{
    AppEvent, CatalogEvent, GeneralEvent, MetadataEvent, PruneEvent, TrustEvent, VerifyEvent,
};
use tracing::Level;

/// Emit a record at a level chosen at runtime
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    }};
}

/// Log an `AppEvent` through the tracing infrastructure
pub fn log_event(event: &AppEvent) {
    let level = event.log_level();
    let domain = event.log_target();

    match event {
        AppEvent::General(general) => log_general(level, domain, general),
        AppEvent::Trust(trust) => log_trust(level, domain, trust),
        AppEvent::Metadata(metadata) => log_metadata(level, domain, metadata),
        AppEvent::Catalog(catalog) => log_catalog(level, domain, catalog),
        AppEvent::Verify(verify) => log_verify(level, domain, verify),
        AppEvent::Prune(prune) => log_prune(level, domain, prune),
    }
}

fn log_general(level: Level, domain: &str, event: &GeneralEvent) {
    match event {
        GeneralEvent::Warning { message, context } => {
            log_at!(level, domain, context = ?context, "{message}");
        }
        GeneralEvent::Error { message, details } => {
            log_at!(level, domain, details = ?details, "{message}");
        }
        GeneralEvent::DebugLog { message, context } => {
            log_at!(level, domain, context = ?context, "{message}");
        }
        GeneralEvent::OperationStarted { operation } => {
            log_at!(level, domain, operation = %operation, "Operation started");
        }
        GeneralEvent::OperationCompleted { operation, success } => {
            log_at!(level, domain, operation = %operation, success, "Operation completed");
        }
        GeneralEvent::OperationFailed { operation, error } => {
            log_at!(level, domain, operation = %operation, error = %error, "Operation failed");
        }
    }
}

fn log_trust(level: Level, domain: &str, event: &TrustEvent) {
    match event {
        TrustEvent::KeyFileLoaded { path, keys } => {
            log_at!(level, domain, path = %path, keys, "Key file loaded");
        }
        TrustEvent::KeyringLoaded {
            source,
            keys,
            signing_keys,
        } => {
            log_at!(level, domain, source = %source, keys, signing_keys, "Keyring loaded");
        }
        TrustEvent::TrustDisabled { reason } => {
            log_at!(level, domain, reason = %reason, "Signature checks disabled, metadata is not authenticated");
        }
        TrustEvent::SignatureFound {
            signature_path,
            issuer,
            signed_at,
        } => {
            log_at!(level, domain, signature = %signature_path, issuer = %issuer, signed_at = ?signed_at, "Signature found");
        }
        TrustEvent::AmbiguousSigner { issuer, candidates } => {
            log_at!(level, domain, issuer = %issuer, candidates, "Several trusted keys share the signer id");
        }
        TrustEvent::SignatureVerified {
            signature_path,
            issuer,
            signed_at,
        } => {
            log_at!(level, domain, signature = %signature_path, issuer = %issuer, signed_at = ?signed_at, "Signature verified");
        }
    }
}

fn log_metadata(level: Level, domain: &str, event: &MetadataEvent) {
    match event {
        MetadataEvent::IndexLoading { path } => {
            log_at!(level, domain, path = %path, "Loading repository index");
        }
        MetadataEvent::IndexLoaded {
            path,
            entries,
            revision,
        } => {
            log_at!(level, domain, path = %path, entries, revision = ?revision, "Repository index loaded");
        }
        MetadataEvent::EntryChecking { kind, path } => {
            log_at!(level, domain, kind = %kind, path = %path, "Checking metadata file");
        }
        MetadataEvent::EntryMismatch { kind, path, reason } => {
            log_at!(level, domain, kind = %kind, path = %path, reason = %reason, "Metadata file failed");
        }
        MetadataEvent::PrimaryLocated { path } => {
            log_at!(level, domain, path = %path, "Primary catalog located");
        }
    }
}

fn log_catalog(level: Level, domain: &str, event: &CatalogEvent) {
    match event {
        CatalogEvent::Loading {
            path,
            supplementary,
        } => {
            log_at!(level, domain, path = %path, supplementary, "Loading catalog");
        }
        CatalogEvent::Loaded {
            path,
            records,
            added,
        } => {
            log_at!(level, domain, path = %path, records, added, "Catalog loaded");
        }
        CatalogEvent::DuplicateLocation { path, catalog } => {
            log_at!(level, domain, path = %path, catalog = %catalog, "Duplicate package location, keeping the first");
        }
        CatalogEvent::ChecksumDisagreement {
            path,
            kept,
            ignored,
            catalog,
        } => {
            log_at!(level, domain, path = %path, kept = %kept, ignored = %ignored, catalog = %catalog, "Catalogs disagree on checksum, keeping the first");
        }
        CatalogEvent::Built { entries, sources } => {
            log_at!(level, domain, entries, sources, "Catalog built");
        }
    }
}

fn log_verify(level: Level, domain: &str, event: &VerifyEvent) {
    match event {
        VerifyEvent::Started { files, workers } => {
            log_at!(level, domain, files, workers, "Verifying package files");
        }
        VerifyEvent::FilePassed { path } => {
            log_at!(level, domain, path = %path, "File ok");
        }
        VerifyEvent::FileFailed {
            path,
            outcome,
            reason,
        } => {
            log_at!(level, domain, path = %path, outcome = %outcome, reason = ?reason, "File failed");
        }
        VerifyEvent::Completed {
            checked,
            failed,
            duration_ms,
        } => {
            log_at!(level, domain, checked, failed, duration_ms, "Verification finished");
        }
    }
}

fn log_prune(level: Level, domain: &str, event: &PruneEvent) {
    match event {
        PruneEvent::Started { root, destructive } => {
            log_at!(level, domain, root = %root, destructive, "Scanning for orphaned packages");
        }
        PruneEvent::OrphanFound { path } => {
            log_at!(level, domain, path = %path, "Orphaned package");
        }
        PruneEvent::OrphanRemoved { path } => {
            log_at!(level, domain, path = %path, "Orphaned package removed");
        }
        PruneEvent::Completed {
            scanned,
            orphans,
            removed,
        } => {
            log_at!(level, domain, scanned, orphans, removed, "Orphan scan finished");
        }
    }
}
