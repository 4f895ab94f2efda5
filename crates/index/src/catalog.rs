//! Package catalog construction

use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use mirrorcheck_config::constants::PRIMARY_CATALOG_STEM;
use mirrorcheck_errors::{Error, MetadataError};
use mirrorcheck_events::{AppEvent, CatalogEvent, EventEmitter};
use mirrorcheck_hash::Checksum;

use crate::decompress::read_metadata_file;
use crate::models::{PrimaryMetadata, XmlPackage};
use crate::{IndexLocation, ReportLine, ResolvedIndex};

/// One package row of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub arch: Option<String>,
    /// Mirror-relative path, the catalog key
    pub path: String,
    /// Algorithm tag as written in the catalog
    pub algorithm: String,
    /// Checksum as written in the catalog
    pub checksum: String,
    pub package_size: u64,
    pub installed_size: u64,
    pub archive_size: u64,
}

impl PackageRecord {
    fn from_xml(package: XmlPackage, location: &IndexLocation) -> Self {
        Self {
            name: package.name,
            arch: package.arch,
            path: location.mirror_relative(&package.location.href),
            algorithm: package.checksum.algorithm,
            checksum: package.checksum.value.trim().to_string(),
            package_size: package.size.package,
            installed_size: package.size.installed,
            archive_size: package.size.archive,
        }
    }

    /// The declared checksum, if its algorithm and value are well formed
    ///
    /// # Errors
    /// Returns an error for an unknown algorithm tag or malformed hex.
    pub fn expected(&self) -> Result<Checksum, Error> {
        Checksum::parse(&self.algorithm, &self.checksum)
    }

    /// Whether two records declare the same content
    #[must_use]
    pub fn same_checksum(&self, other: &Self) -> bool {
        match (self.expected(), other.expected()) {
            (Ok(a), Ok(b)) => a == b,
            _ => {
                self.algorithm.eq_ignore_ascii_case(&other.algorithm)
                    && self.checksum.eq_ignore_ascii_case(&other.checksum)
            }
        }
    }

    /// Failure line for this record
    #[must_use]
    pub fn report_line(&self) -> ReportLine {
        ReportLine {
            algorithm: self.algorithm.clone(),
            checksum: self.checksum.clone(),
            size: self.package_size,
            path: self.path.clone(),
        }
    }
}

/// Mapping from mirror-relative path to the record describing it
///
/// Read-only once built. Iteration is in path order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    base: PathBuf,
    records: BTreeMap<String, PackageRecord>,
    sources: Vec<PathBuf>,
}

impl Catalog {
    /// An empty catalog for the mirror rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            records: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    /// Mirror base the record paths are relative to
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&PackageRecord> {
        self.records.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.values()
    }

    /// Catalog files merged into this catalog, primary first
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// On-disk location of a record
    #[must_use]
    pub fn disk_path(&self, record: &PackageRecord) -> PathBuf {
        self.base.join(&record.path)
    }

    /// Insert a record unless its path is already present
    ///
    /// Returns the record that was kept when the path already existed.
    pub fn insert_first(&mut self, record: PackageRecord) -> Option<&PackageRecord> {
        match self.records.entry(record.path.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                None
            }
            btree_map::Entry::Occupied(existing) => Some(&*existing.into_mut()),
        }
    }

    fn merge(
        &mut self,
        source: &Path,
        packages: Vec<XmlPackage>,
        location: &IndexLocation,
        supplementary: bool,
        emitter: &impl EventEmitter,
    ) -> usize {
        let catalog_name = source.display().to_string();
        let mut added = 0;
        let mut seen_here = std::collections::HashSet::new();

        for package in packages {
            let record = PackageRecord::from_xml(package, location);
            let duplicate_in_source = !seen_here.insert(record.path.clone());
            let path = record.path.clone();
            let incoming = record.clone();

            match self.insert_first(record) {
                None => added += 1,
                Some(kept) => {
                    if duplicate_in_source {
                        emitter.emit(AppEvent::Catalog(CatalogEvent::DuplicateLocation {
                            path,
                            catalog: catalog_name.clone(),
                        }));
                    } else if supplementary && !kept.same_checksum(&incoming) {
                        emitter.emit(AppEvent::Catalog(CatalogEvent::ChecksumDisagreement {
                            path,
                            kept: format!("{{{}}}{}", kept.algorithm, kept.checksum),
                            ignored: format!("{{{}}}{}", incoming.algorithm, incoming.checksum),
                            catalog: catalog_name.clone(),
                        }));
                    }
                }
            }
        }

        self.sources.push(source.to_path_buf());
        added
    }
}

/// Catalog construction switches
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Also merge other `*-primary.xml*` files found in the repodata directory
    pub supplementary: bool,
}

/// Build the catalog from the resolved primary and, optionally, the
/// supplementary catalogs next to it
///
/// Supplementary catalogs never override a path already present; a
/// disagreeing checksum is surfaced as an event. A supplementary catalog
/// that cannot be read is skipped with a warning.
///
/// # Errors
/// Returns an error if the primary catalog cannot be read, decompressed or
/// parsed.
pub async fn build_catalog(
    resolved: &ResolvedIndex,
    options: &CatalogOptions,
    emitter: &impl EventEmitter,
) -> Result<Catalog, Error> {
    let location = &resolved.location;
    let mut catalog = Catalog::new(location.base());

    emitter.emit(AppEvent::Catalog(CatalogEvent::Loading {
        path: resolved.primary_path.display().to_string(),
        supplementary: false,
    }));
    let primary = load_catalog_file(&resolved.primary_path).await?;
    let records = primary.packages.len();
    let added = catalog.merge(&resolved.primary_path, primary.packages, location, false, emitter);
    emitter.emit(AppEvent::Catalog(CatalogEvent::Loaded {
        path: resolved.primary_path.display().to_string(),
        records,
        added,
    }));

    if options.supplementary {
        for path in supplementary_catalogs(&location.repodata_dir(), &resolved.primary_path).await? {
            emitter.emit(AppEvent::Catalog(CatalogEvent::Loading {
                path: path.display().to_string(),
                supplementary: true,
            }));
            let parsed = match load_catalog_file(&path).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    emitter.emit_warning_with_context(
                        "skipping unreadable supplementary catalog",
                        e.to_string(),
                    );
                    continue;
                }
            };
            let records = parsed.packages.len();
            let added = catalog.merge(&path, parsed.packages, location, true, emitter);
            emitter.emit(AppEvent::Catalog(CatalogEvent::Loaded {
                path: path.display().to_string(),
                records,
                added,
            }));
        }
    }

    emitter.emit(AppEvent::Catalog(CatalogEvent::Built {
        entries: catalog.len(),
        sources: catalog.sources().len(),
    }));
    Ok(catalog)
}

async fn load_catalog_file(path: &Path) -> Result<PrimaryMetadata, Error> {
    let bytes = read_metadata_file(path).await?;
    let text = String::from_utf8(bytes).map_err(|e| MetadataError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    quick_xml::de::from_str(&text).map_err(|e| {
        MetadataError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Other primary catalogs in `repodata`, sorted by file name, excluding
/// the one already used as primary
async fn supplementary_catalogs(repodata: &Path, primary: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut dir = tokio::fs::read_dir(repodata)
        .await
        .map_err(|e| Error::io_with_path(&e, repodata))?;
    let primary = tokio::fs::canonicalize(primary)
        .await
        .unwrap_or_else(|_| primary.to_path_buf());

    let mut found = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, repodata))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let is_catalog = entry
            .file_name()
            .to_string_lossy()
            .contains(PRIMARY_CATALOG_STEM);
        if !is_file || !is_catalog {
            continue;
        }
        let path = entry.path();
        let canonical = tokio::fs::canonicalize(&path)
            .await
            .unwrap_or_else(|_| path.clone());
        if canonical != primary {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
