//! The check run
//!
//! `Start → TrustEstablished → IndexResolved → CatalogBuilt → {Reconciled, Pruned} → Done`.
//! `TrustEstablished` is skipped when signature checks are disabled and
//! `Pruned` when pruning is off. Any error on the way is terminal.

use std::sync::Arc;

use mirrorcheck_config::{Config, PruneMode};
use mirrorcheck_errors::Error;
use mirrorcheck_events::{AppEvent, EventEmitter, TrustEvent};
use mirrorcheck_guard::{
    plan_prune, reconcile, PruneAction, PruneOptions, PruneSummary, ReconcileOptions,
};
use mirrorcheck_index::{build_catalog, resolve_index, CatalogOptions, IndexLocation};
use mirrorcheck_signing::{load_keyring, TrustPolicy};

use crate::CheckContext;

/// Engine states, recorded in the order they were reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    TrustEstablished,
    IndexResolved,
    CatalogBuilt,
    Reconciled,
    Pruned,
    Done,
}

/// Counts of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub stages: Vec<Stage>,
    /// Key id of the index signer when trust was enforced
    pub signer: Option<String>,
    pub metadata_failures: usize,
    pub catalog_entries: usize,
    pub checked: usize,
    pub passed: usize,
    pub package_failures: usize,
    pub orphans: usize,
    pub removed: usize,
    pub remove_failures: usize,
}

impl RunOutcome {
    /// True when no metadata or package file failed and every orphan
    /// selected for deletion was removed
    #[must_use]
    pub fn success(&self) -> bool {
        self.metadata_failures == 0 && self.package_failures == 0 && self.remove_failures == 0
    }

    #[must_use]
    pub fn reached(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Run a full check of the configured mirror
///
/// Report lines are written to the context's sink: failed metadata files
/// first, then failed packages in path order, then orphans when pruning in
/// report mode.
///
/// # Errors
///
/// Returns an error for every fatal condition: an unusable keyring, an
/// unreadable or untrusted index, a missing primary catalog, a failed prune
/// walk or an unwritable report.
pub async fn run_check(ctx: &CheckContext) -> Result<RunOutcome, Error> {
    ctx.emit_operation_started("check");
    match run_stages(ctx).await {
        Ok(outcome) => {
            ctx.emit_operation_completed("check", outcome.success());
            Ok(outcome)
        }
        Err(e) => {
            ctx.emit_operation_failed("check", e.to_string());
            Err(e)
        }
    }
}

async fn run_stages(ctx: &CheckContext) -> Result<RunOutcome, Error> {
    let config = &ctx.config;
    let mut outcome = RunOutcome {
        stages: vec![Stage::Start],
        ..RunOutcome::default()
    };

    let policy = trust_policy(ctx)?;
    let location = index_location(config);

    let resolved = resolve_index(&location, &policy, ctx).await?;
    if let Some(signature) = &resolved.signature {
        outcome.signer = Some(signature.assertion.issuer.to_string());
        outcome.stages.push(Stage::TrustEstablished);
    }
    outcome.stages.push(Stage::IndexResolved);

    for line in &resolved.failures {
        ctx.sink.write_line(&line.to_string())?;
    }
    outcome.metadata_failures = resolved.failures.len();

    let catalog_options = CatalogOptions {
        supplementary: config.scan.supplementary_catalogs,
    };
    let catalog = Arc::new(build_catalog(&resolved, &catalog_options, ctx).await?);
    outcome.catalog_entries = catalog.len();
    outcome.stages.push(Stage::CatalogBuilt);

    let reconcile_options = ReconcileOptions {
        jobs: config.jobs(),
        io_timeout: config.io_timeout(),
    };
    let prune_options = prune_action(config.prune.mode).map(|action| PruneOptions {
        root: location.repo_root(),
        action,
        package_suffix: config.scan.package_suffix.clone(),
    });

    // The two scans share the catalog read-only and run side by side
    let (reconciled, pruned) = tokio::join!(
        reconcile(Arc::clone(&catalog), &reconcile_options, &ctx.tx),
        async {
            match &prune_options {
                Some(options) => plan_prune(Arc::clone(&catalog), options, &ctx.tx)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        }
    );
    let reconciled = reconciled?;
    let pruned: Option<PruneSummary> = pruned?;

    for line in reconciled.report_lines() {
        ctx.sink.write_line(&line.to_string())?;
    }
    outcome.checked = reconciled.checked();
    outcome.passed = reconciled.passed();
    outcome.package_failures = reconciled.failed;
    outcome.stages.push(Stage::Reconciled);

    if let Some(summary) = pruned {
        if prune_options.as_ref().map(|o| o.action) == Some(PruneAction::Report) {
            for orphan in summary.orphans() {
                ctx.sink.write_line(&orphan.path)?;
            }
        }
        outcome.orphans = summary.orphan_count();
        outcome.removed = summary.removed.len();
        outcome.remove_failures = summary.remove_failures.len();
        outcome.stages.push(Stage::Pruned);
    }

    ctx.sink.flush()?;
    outcome.stages.push(Stage::Done);
    Ok(outcome)
}

fn trust_policy(ctx: &CheckContext) -> Result<TrustPolicy, Error> {
    if !ctx.config.security.verify_signatures {
        ctx.emit(AppEvent::Trust(TrustEvent::TrustDisabled {
            reason: "signature verification is disabled".to_string(),
        }));
        return Ok(TrustPolicy::Disabled);
    }

    let source = ctx.config.keyring_path();
    let keyring = load_keyring(&source)?;
    for key_file in keyring.sources() {
        ctx.emit(AppEvent::Trust(TrustEvent::KeyFileLoaded {
            path: key_file.path.display().to_string(),
            keys: key_file.keys,
        }));
    }
    ctx.emit(AppEvent::Trust(TrustEvent::KeyringLoaded {
        source: source.display().to_string(),
        keys: keyring.len(),
        signing_keys: keyring.signing_key_count(),
    }));
    Ok(TrustPolicy::Enforced(keyring))
}

fn index_location(config: &Config) -> IndexLocation {
    let location = IndexLocation::new(config.base_path(), &config.repo_path());
    match &config.paths.repodata {
        Some(repodata) => location.with_repodata(repodata),
        None => location,
    }
}

fn prune_action(mode: PruneMode) -> Option<PruneAction> {
    match mode {
        PruneMode::Off => None,
        PruneMode::Report => Some(PruneAction::Report),
        PruneMode::Delete => Some(PruneAction::Delete),
    }
}
