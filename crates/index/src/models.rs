//! XML document models for `repomd.xml` and primary package catalogs
//!
//! Only the fields the checker needs are modelled; everything else in the
//! documents is ignored during deserialization.

use serde::Deserialize;

/// Top-level `repomd.xml`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMd {
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(rename = "data", default)]
    pub data: Vec<RepoMdData>,
}

/// One `<data type="...">` entry of `repomd.xml`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMdData {
    #[serde(rename = "@type")]
    pub kind: String,
    pub checksum: XmlChecksum,
    pub location: XmlLocation,
    #[serde(default)]
    pub size: u64,
}

/// `<checksum type="sha256">hex</checksum>`
#[derive(Debug, Clone, Deserialize)]
pub struct XmlChecksum {
    #[serde(rename = "@type")]
    pub algorithm: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// `<location href="..."/>`
#[derive(Debug, Clone, Deserialize)]
pub struct XmlLocation {
    #[serde(rename = "@href")]
    pub href: String,
}

/// Root `<metadata>` element of a primary catalog
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryMetadata {
    #[serde(rename = "@packages", default)]
    pub declared_packages: Option<usize>,
    #[serde(rename = "package", default)]
    pub packages: Vec<XmlPackage>,
}

/// One `<package>` of a primary catalog
#[derive(Debug, Clone, Deserialize)]
pub struct XmlPackage {
    pub name: String,
    #[serde(default)]
    pub arch: Option<String>,
    pub checksum: XmlChecksum,
    #[serde(default)]
    pub size: XmlSize,
    pub location: XmlLocation,
}

/// `<size package=".." installed=".." archive=".."/>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlSize {
    #[serde(rename = "@package", default)]
    pub package: u64,
    #[serde(rename = "@installed", default)]
    pub installed: u64,
    #[serde(rename = "@archive", default)]
    pub archive: u64,
}
