//! Disk to catalog: find package files the catalog does not reference

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use mirrorcheck_config::constants::PACKAGE_SUFFIX;
use mirrorcheck_errors::{Error, GuardError};
use mirrorcheck_events::{AppEvent, EventEmitter, EventSender, PruneEvent};
use mirrorcheck_index::Catalog;
use walkdir::WalkDir;

use crate::types::{PruneAction, PruneDecision, PruneEntry, PruneSummary};

/// Where and how to prune
#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Directory walked for package files, inside the catalog base
    pub root: PathBuf,
    pub action: PruneAction,
    /// File name suffix identifying package files
    pub package_suffix: String,
}

impl PruneOptions {
    pub fn new(root: impl Into<PathBuf>, action: PruneAction) -> Self {
        Self {
            root: root.into(),
            action,
            package_suffix: PACKAGE_SUFFIX.to_string(),
        }
    }
}

/// Classify every package file under `options.root` against the catalog
///
/// The tree is walked completely before anything is classified or deleted,
/// so a walk error leaves the mirror untouched. Files are keyed by their
/// path relative to the catalog base.
///
/// # Errors
/// Returns an error if any part of the directory walk fails.
pub async fn plan_prune(
    catalog: Arc<Catalog>,
    options: &PruneOptions,
    tx: &EventSender,
) -> Result<PruneSummary, Error> {
    tx.emit(AppEvent::Prune(PruneEvent::Started {
        root: options.root.display().to_string(),
        destructive: options.action == PruneAction::Delete,
    }));

    let files = {
        let root = options.root.clone();
        let suffix = options.package_suffix.clone();
        tokio::task::spawn_blocking(move || collect_package_files(&root, &suffix))
            .await
            .map_err(|e| GuardError::TaskFailed {
                operation: "prune walk".to_string(),
                reason: e.to_string(),
            })??
    };

    let mut summary = PruneSummary::default();
    for disk_path in files {
        let path = mirror_key(catalog.base(), &disk_path);
        let decision = if catalog.contains(&path) {
            PruneDecision::Referenced
        } else {
            PruneDecision::Orphan
        };

        if decision == PruneDecision::Orphan {
            tx.emit(AppEvent::Prune(PruneEvent::OrphanFound { path: path.clone() }));
            if options.action == PruneAction::Delete {
                match tokio::fs::remove_file(&disk_path).await {
                    Ok(()) => {
                        tx.emit(AppEvent::Prune(PruneEvent::OrphanRemoved { path: path.clone() }));
                        summary.removed.push(path.clone());
                    }
                    Err(e) => {
                        let err = GuardError::RemoveFailed {
                            path: disk_path.display().to_string(),
                            reason: e.to_string(),
                        };
                        tx.emit_error(err.to_string());
                        summary.remove_failures.push((path.clone(), e.to_string()));
                    }
                }
            }
        }

        summary.entries.push(PruneEntry {
            path,
            disk_path,
            decision,
        });
    }

    tx.emit(AppEvent::Prune(PruneEvent::Completed {
        scanned: summary.scanned(),
        orphans: summary.orphan_count(),
        removed: summary.removed.len(),
    }));
    Ok(summary)
}

fn collect_package_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| GuardError::WalkFailed {
            root: root.display().to_string(),
            reason: e.to_string(),
        })?;
        // Symlinks are candidates too; deleting one removes the link, never its target
        if !entry.file_type().is_dir() && entry.file_name().to_string_lossy().ends_with(suffix) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `/`-joined path of `path` relative to `base`
fn mirror_key(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
