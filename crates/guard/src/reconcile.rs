//! Catalog to disk: checksum every referenced file

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mirrorcheck_errors::{Error, GuardError, StorageError};
use mirrorcheck_events::{AppEvent, EventEmitter, EventSender, VerifyEvent};
use mirrorcheck_hash::Checksum;
use mirrorcheck_index::{Catalog, PackageRecord};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::types::{Outcome, ReconcileSummary, VerificationResult};

/// Bounds for the verification workers
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Maximum concurrent file checks
    pub jobs: usize,
    /// Per-file limit; a file exceeding it is unreadable
    ///
    /// The limit abandons the check, not the read. A read stuck in the
    /// kernel keeps its blocking-pool thread until it returns, and dropping
    /// the runtime waits for that thread. Embedders that must not hang on
    /// exit should shut their runtime down with `Runtime::shutdown_timeout`.
    pub io_timeout: Option<Duration>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            io_timeout: None,
        }
    }
}

/// Check every catalog record against the file on disk
///
/// The pass is exhaustive: a failing file never stops the remaining
/// checks. Results are returned in catalog path order regardless of the
/// order workers finish in.
///
/// # Errors
/// Returns an error only if a worker task panics or the worker pool breaks.
pub async fn reconcile(
    catalog: Arc<Catalog>,
    options: &ReconcileOptions,
    tx: &EventSender,
) -> Result<ReconcileSummary, Error> {
    let started = Instant::now();
    let workers = options.jobs.max(1);
    tx.emit(AppEvent::Verify(VerifyEvent::Started {
        files: catalog.len(),
        workers,
    }));

    let semaphore = Arc::new(Semaphore::new(workers));
    let failed = Arc::new(AtomicUsize::new(0));
    let mut tasks = JoinSet::new();

    for record in catalog.iter() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| GuardError::TaskFailed {
                operation: "reconcile".to_string(),
                reason: format!("semaphore acquire error: {e}"),
            })?;
        let record = record.clone();
        let disk_path = catalog.disk_path(&record);
        let failed = Arc::clone(&failed);
        let tx = tx.clone();
        let timeout = options.io_timeout;

        tasks.spawn(async move {
            let _permit = permit; // Hold permit until task completes
            let result = check_record(record, &disk_path, timeout).await;
            if result.outcome.is_ok() {
                tx.emit(AppEvent::Verify(VerifyEvent::FilePassed {
                    path: result.path.clone(),
                }));
            } else {
                failed.fetch_add(1, Ordering::Relaxed);
                tx.emit(AppEvent::Verify(VerifyEvent::FileFailed {
                    path: result.path.clone(),
                    outcome: result.outcome.to_string(),
                    reason: result.detail.clone(),
                }));
            }
            result
        });
    }

    let mut results = Vec::with_capacity(catalog.len());
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| GuardError::TaskFailed {
            operation: "reconcile".to_string(),
            reason: e.to_string(),
        })?;
        results.push(result);
    }

    // Sort results by path for deterministic output
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let summary = ReconcileSummary {
        results,
        failed: failed.load(Ordering::Relaxed),
        duration: started.elapsed(),
    };
    tx.emit(AppEvent::Verify(VerifyEvent::Completed {
        checked: summary.checked(),
        failed: summary.failed,
        duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
    }));
    Ok(summary)
}

async fn check_record(
    record: PackageRecord,
    disk_path: &Path,
    timeout: Option<Duration>,
) -> VerificationResult {
    let (outcome, detail) = match record.expected() {
        Ok(expected) => match hash_with_timeout(&expected, disk_path, timeout).await {
            Ok(actual) if actual == expected => (Outcome::Ok, None),
            Ok(actual) => (Outcome::Mismatch, Some(format!("got {actual}"))),
            Err(e) => (Outcome::Unreadable, Some(e.to_string())),
        },
        Err(e) => (Outcome::Unreadable, Some(e.to_string())),
    };

    VerificationResult {
        expected: record.report_line(),
        path: record.path,
        outcome,
        detail,
    }
}

async fn hash_with_timeout(
    expected: &Checksum,
    path: &Path,
    timeout: Option<Duration>,
) -> Result<Checksum, Error> {
    let hashing = Checksum::hash_file(expected.algorithm(), path);
    match timeout {
        None => hashing.await,
        Some(limit) => tokio::time::timeout(limit, hashing)
            .await
            .unwrap_or_else(|_| {
                Err(StorageError::Timeout {
                    path: path.display().to_string(),
                    seconds: limit.as_secs(),
                }
                .into())
            }),
    }
}
