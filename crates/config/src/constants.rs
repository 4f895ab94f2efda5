//! Well-known file names of an RPM repository tree
//!
//! These follow the layout `createrepo` produces and are not configurable.

/// Directory holding the repository metadata, relative to the repository root
pub const REPODATA_DIR: &str = "repodata";

/// Top-level metadata index
pub const INDEX_FILE: &str = "repomd.xml";

/// Suffix of the detached armored signature next to the index
pub const SIGNATURE_SUFFIX: &str = ".asc";

/// Suffix of key files picked up when the keyring source is a directory
pub const KEY_FILE_SUFFIX: &str = ".gpg";

/// Default suffix of package files considered by the prune walk
pub const PACKAGE_SUFFIX: &str = ".rpm";

/// Name fragment shared by every primary package catalog
pub const PRIMARY_CATALOG_STEM: &str = "-primary.xml";

/// Index entry type naming the primary catalog
pub const PRIMARY_TYPE: &str = "primary";

/// Upper bound for auto-detected verification workers
pub const MAX_AUTO_JOBS: usize = 32;
