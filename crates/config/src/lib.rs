#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mirrorcheck
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/mirrorcheck/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary on top of the result)

pub mod constants;

use mirrorcheck_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub prune: PruneConfig,
}

/// Mirror locations
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Mirror base directory
    pub base: Option<PathBuf>,
    /// Repository sub-path below the base, e.g. `7/os/x86_64`
    pub repo: Option<String>,
    /// Explicit repodata directory overriding `base/repo/repodata`
    pub repodata: Option<PathBuf>,
    /// Report destination, `-` for stdout
    pub output: Option<String>,
    /// Key file or directory of `.gpg` files
    pub keyring: Option<PathBuf>,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_verify_signatures")]
    pub verify_signatures: bool,
}

/// Verification scan tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_jobs")]
    pub jobs: usize, // 0 = auto-detect
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64, // 0 = no timeout
    #[serde(default)]
    pub supplementary_catalogs: bool,
    #[serde(default = "default_package_suffix")]
    pub package_suffix: String,
}

/// Prune configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PruneConfig {
    #[serde(default)]
    pub mode: PruneMode,
}

/// What to do with package files the catalog does not reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PruneMode {
    /// Skip the prune pass
    #[default]
    Off,
    /// List orphans without touching them
    Report,
    /// Delete orphans
    Delete,
}

impl FromStr for PruneMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "false" | "0" => Ok(Self::Off),
            "report" | "test" => Ok(Self::Report),
            "delete" => Ok(Self::Delete),
            _ => Err(ConfigError::InvalidValue {
                field: "prune.mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PruneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Report => "report",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

// Default implementations

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            verify_signatures: true,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            jobs: 0, // 0 = auto-detect
            io_timeout_secs: 0,
            supplementary_catalogs: false,
            package_suffix: constants::PACKAGE_SUFFIX.to_string(),
        }
    }
}

// Default value functions for serde
fn default_verify_signatures() -> bool {
    true
}

fn default_jobs() -> usize {
    0 // 0 = auto-detect
}

fn default_io_timeout_secs() -> u64 {
    0
}

fn default_package_suffix() -> String {
    constants::PACKAGE_SUFFIX.to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("mirrorcheck").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // MIRRORCHECK_BASE
        if let Ok(base) = std::env::var("MIRRORCHECK_BASE") {
            self.paths.base = Some(PathBuf::from(base));
        }

        // MIRRORCHECK_REPO
        if let Ok(repo) = std::env::var("MIRRORCHECK_REPO") {
            self.paths.repo = Some(repo);
        }

        // MIRRORCHECK_KEYRING
        if let Ok(keyring) = std::env::var("MIRRORCHECK_KEYRING") {
            self.paths.keyring = Some(PathBuf::from(keyring));
        }

        // MIRRORCHECK_JOBS
        if let Ok(jobs) = std::env::var("MIRRORCHECK_JOBS") {
            self.scan.jobs = jobs.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MIRRORCHECK_JOBS".to_string(),
                value: jobs,
            })?;
        }

        // MIRRORCHECK_INSECURE
        if let Ok(insecure) = std::env::var("MIRRORCHECK_INSECURE") {
            self.security.verify_signatures = match insecure.as_str() {
                "true" | "1" | "yes" => false,
                "false" | "0" | "no" => true,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MIRRORCHECK_INSECURE".to_string(),
                        value: insecure,
                    }
                    .into())
                }
            };
        }

        // MIRRORCHECK_PRUNE
        if let Ok(prune) = std::env::var("MIRRORCHECK_PRUNE") {
            self.prune.mode = prune.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MIRRORCHECK_PRUNE".to_string(),
                value: prune,
            })?;
        }

        Ok(())
    }

    /// Reject values that would make the scan meaningless
    ///
    /// # Errors
    ///
    /// Returns an error if the package suffix is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.scan.package_suffix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "scan.package_suffix must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the mirror base path (with default)
    #[must_use]
    pub fn base_path(&self) -> PathBuf {
        self.paths
            .base
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the repository sub-path with surrounding slashes removed
    #[must_use]
    pub fn repo_path(&self) -> String {
        normalize_repo(self.paths.repo.as_deref().unwrap_or_default())
    }

    /// Get the keyring source (with default)
    #[must_use]
    pub fn keyring_path(&self) -> PathBuf {
        self.paths
            .keyring
            .clone()
            .unwrap_or_else(|| PathBuf::from("keys/"))
    }

    /// Get the report destination (with default)
    #[must_use]
    pub fn output(&self) -> &str {
        self.paths.output.as_deref().unwrap_or("-")
    }

    /// Resolved worker count for the verification pass
    #[must_use]
    pub fn jobs(&self) -> usize {
        calculate_jobs(self.scan.jobs)
    }

    /// Per-file checksum timeout, if any
    #[must_use]
    pub fn io_timeout(&self) -> Option<std::time::Duration> {
        (self.scan.io_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.scan.io_timeout_secs))
    }
}

/// Trim surrounding slashes from a repository sub-path
#[must_use]
pub fn normalize_repo(repo: &str) -> String {
    repo.trim().trim_matches('/').to_string()
}

/// Calculate verification workers based on CPU count
#[must_use]
pub fn calculate_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value // User override
    } else {
        num_cpus::get().clamp(1, constants::MAX_AUTO_JOBS)
    }
}
