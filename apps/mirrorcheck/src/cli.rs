//! Command line interface definition

use clap::Parser;
use std::path::PathBuf;

/// mirrorcheck - verify a local RPM repository mirror
#[derive(Parser, Debug)]
#[command(name = "mirrorcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify a local RPM repository mirror against its signed metadata")]
#[command(long_about = None)]
pub struct Cli {
    /// Path to the mirror base
    #[arg(long = "path", short = 'p', value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Repository to check, relative to the base (example "/7/os/x86_64")
    #[arg(long, short = 'r', value_name = "SUBPATH")]
    pub repo: Option<String>,

    /// Where to write failed files and orphans ("-" for stdout)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Explicit repodata directory holding repomd.xml
    #[arg(long, value_name = "DIR")]
    pub repodata: Option<PathBuf>,

    /// Skip signature checks
    #[arg(long)]
    pub insecure: bool,

    /// Find and remove package files not listed in the catalog
    #[arg(long, conflicts_with = "prune_test")]
    pub prune: bool,

    /// Find and list package files not listed in the catalog
    #[arg(long = "prune-test")]
    pub prune_test: bool,

    /// Also merge every other primary catalog found in the repodata directory
    #[arg(long)]
    pub multi: bool,

    /// Keyring used for verifying: a key file or a directory of .gpg files
    #[arg(long, short = 'k', value_name = "PATH")]
    pub keyring: Option<PathBuf>,

    /// Number of concurrent file checks (0 = number of CPUs)
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Per-file read timeout in seconds (0 = none)
    #[arg(long = "io-timeout", value_name = "SECS")]
    pub io_timeout: Option<u64>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Turn on debug logging
    #[arg(long)]
    pub debug: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "json-logs")]
    pub json_logs: bool,
}
