#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Repository metadata for mirrorcheck
//!
//! Resolves `repomd.xml` down to the primary package catalog and builds the
//! [`Catalog`] that the reconciliation and prune passes share.

mod catalog;
mod decompress;
mod location;
pub mod models;
mod repomd;
mod report;

pub use catalog::{build_catalog, Catalog, CatalogOptions, PackageRecord};
pub use decompress::{read_metadata_file, Compression};
pub use location::{normalize_relative, IndexLocation};
pub use repomd::{resolve_index, MetadataEntry, ResolvedIndex};
pub use report::ReportLine;
