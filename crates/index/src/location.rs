//! Mirror layout and path normalization

use std::path::{Path, PathBuf};

use mirrorcheck_config::constants::{INDEX_FILE, REPODATA_DIR, SIGNATURE_SUFFIX};

/// Where a repository lives inside a mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocation {
    base: PathBuf,
    repo: String,
    repodata: Option<PathBuf>,
}

impl IndexLocation {
    /// `repo` is the sub-path below `base`; surrounding slashes are ignored.
    pub fn new(base: impl Into<PathBuf>, repo: &str) -> Self {
        Self {
            base: base.into(),
            repo: normalize_relative(repo),
            repodata: None,
        }
    }

    /// Read `repomd.xml` from an explicit directory instead of `base/repo/repodata`
    #[must_use]
    pub fn with_repodata(mut self, repodata: impl Into<PathBuf>) -> Self {
        self.repodata = Some(repodata.into());
        self
    }

    /// Mirror base directory
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Normalized repository sub-path, empty for a repository at the base
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// `base/repo`
    #[must_use]
    pub fn repo_root(&self) -> PathBuf {
        if self.repo.is_empty() {
            self.base.clone()
        } else {
            self.base.join(&self.repo)
        }
    }

    #[must_use]
    pub fn repodata_dir(&self) -> PathBuf {
        self.repodata
            .clone()
            .unwrap_or_else(|| self.repo_root().join(REPODATA_DIR))
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.repodata_dir().join(INDEX_FILE)
    }

    #[must_use]
    pub fn signature_path(&self) -> PathBuf {
        self.repodata_dir()
            .join(format!("{INDEX_FILE}{SIGNATURE_SUFFIX}"))
    }

    /// Mirror-relative key for an href taken from repository metadata
    #[must_use]
    pub fn mirror_relative(&self, href: &str) -> String {
        normalize_relative(&format!("{}/{href}", self.repo))
    }

    /// On-disk location of an href taken from repository metadata
    #[must_use]
    pub fn resolve(&self, href: &str) -> PathBuf {
        self.base.join(self.mirror_relative(href))
    }
}

/// Normalize a `/`-separated relative path
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and
/// never climbs above the root, and the result has no leading or trailing
/// slash.
#[must_use]
pub fn normalize_relative(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
