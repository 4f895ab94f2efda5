//! mirrorcheck - verify a local RPM repository mirror
//!
//! Parses flags, layers them over the config file and environment, runs the
//! check through the ops crate and turns its outcome into the exit status.
//! Report lines go to the output sink, logs go to stderr.

mod cli;
mod error;
mod logging;

use crate::cli::Cli;
use crate::error::CliError;
use clap::Parser;
use mirrorcheck_config::{Config, PruneMode};
use mirrorcheck_events::EventReceiver;
use mirrorcheck_ops::{run_check, CheckContext, CheckContextBuilder, RunOutcome, WriterSink};
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs, cli.debug);

    match run(cli).await {
        Ok(outcome) if outcome.success() => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            error!("Check aborted: {}", e);
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<RunOutcome, CliError> {
    info!("Starting mirrorcheck v{}", env!("CARGO_PKG_VERSION"));

    // defaults < config file < environment < flags
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli);
    config.validate()?;

    let sink = Arc::new(WriterSink::from_target(config.output())?);
    let (event_sender, event_receiver) = mirrorcheck_events::channel();
    let ctx = CheckContextBuilder::new()
        .with_config(config)
        .with_event_sender(event_sender)
        .with_sink(sink)
        .build()?;

    let outcome = run_with_events(&ctx, event_receiver).await?;
    log_summary(&outcome);
    Ok(outcome)
}

/// Run the check while draining its events
async fn run_with_events(
    ctx: &CheckContext,
    mut event_receiver: EventReceiver,
) -> Result<RunOutcome, CliError> {
    let mut check = Box::pin(run_check(ctx));

    loop {
        select! {
            result = &mut check => {
                while let Ok(event) = event_receiver.try_recv() {
                    logging::log_event(&event);
                }
                return Ok(result?);
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    logging::log_event(&event);
                }
            }
        }
    }
}

/// Apply CLI flags over file and environment configuration
fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.path {
        config.paths.base = Some(path.clone());
    }
    if let Some(repo) = &cli.repo {
        config.paths.repo = Some(repo.clone());
    }
    if let Some(output) = &cli.output {
        config.paths.output = Some(output.clone());
    }
    if let Some(repodata) = &cli.repodata {
        config.paths.repodata = Some(repodata.clone());
    }
    if let Some(keyring) = &cli.keyring {
        config.paths.keyring = Some(keyring.clone());
    }
    if cli.insecure {
        config.security.verify_signatures = false;
    }
    if cli.multi {
        config.scan.supplementary_catalogs = true;
    }
    if let Some(jobs) = cli.jobs {
        config.scan.jobs = jobs;
    }
    if let Some(secs) = cli.io_timeout {
        config.scan.io_timeout_secs = secs;
    }
    if cli.prune {
        config.prune.mode = PruneMode::Delete;
    } else if cli.prune_test {
        config.prune.mode = PruneMode::Report;
    }
}

fn log_summary(outcome: &RunOutcome) {
    let summary = format!(
        "checked={} ok={} metadata_failed={} packages_failed={} orphans={} removed={}",
        outcome.checked,
        outcome.passed,
        outcome.metadata_failures,
        outcome.package_failures,
        outcome.orphans,
        outcome.removed,
    );
    if outcome.success() {
        info!(signer = ?outcome.signer, "Mirror verified: {summary}");
    } else {
        warn!(
            signer = ?outcome.signer,
            remove_failures = outcome.remove_failures,
            "Mirror check failed: {summary}"
        );
    }
}

/// Initialize tracing on stderr
///
/// `RUST_LOG` wins when set; otherwise `--debug` lowers the default filter
/// from info to debug.
fn init_tracing(json_logs: bool, debug: bool) {
    let default_filter = if debug {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
