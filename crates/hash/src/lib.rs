#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content checksums for repository verification
//!
//! Yum-style metadata declares a digest algorithm per record. This crate
//! maps those tags onto a closed set of digest implementations and streams
//! files through the selected one.

use md5::Md5;
use mirrorcheck_errors::{Error, MetadataError, StorageError};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Digest algorithms found in repository metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    /// Written as `sha` by older createrepo versions
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Canonical lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Start a streaming digest for this algorithm
    #[must_use]
    pub fn digester(self) -> Digester {
        match self {
            Self::Md5 => Digester::Md5(Md5::new()),
            Self::Sha1 => Digester::Sha1(Sha1::new()),
            Self::Sha224 => Digester::Sha224(Sha224::new()),
            Self::Sha256 => Digester::Sha256(Sha256::new()),
            Self::Sha384 => Digester::Sha384(Sha384::new()),
            Self::Sha512 => Digester::Sha512(Sha512::new()),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha" | "sha1" => Ok(Self::Sha1),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(MetadataError::UnsupportedChecksum {
                algorithm: s.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-progress digest, one variant per supported algorithm
#[derive(Clone)]
pub enum Digester {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Digester {
    /// Feed bytes into the digest
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Consume the digest and return lowercase hex
    #[must_use]
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha224(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha384(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// A digest value tagged with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    /// Lowercase hex
    value: String,
}

impl Checksum {
    /// Parse a declared checksum from a metadata algorithm tag and hex value
    ///
    /// # Errors
    /// Returns an error if the algorithm tag is unknown, or the value is not
    /// hex of the algorithm's digest length.
    pub fn parse(algorithm: &str, value: &str) -> Result<Self, Error> {
        let algorithm: ChecksumAlgorithm = algorithm.parse()?;
        Self::from_hex(algorithm, value)
    }

    /// Build a checksum from hex, validating its length
    ///
    /// # Errors
    /// Returns an error if the value is not valid hex of the expected length.
    pub fn from_hex(algorithm: ChecksumAlgorithm, value: &str) -> Result<Self, Error> {
        let value = value.trim();
        let valid = value.len() == algorithm.digest_len() * 2
            && value.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(MetadataError::InvalidChecksum {
                algorithm: algorithm.to_string(),
                value: value.to_string(),
            }
            .into());
        }
        Ok(Self {
            algorithm,
            value: value.to_ascii_lowercase(),
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest
    #[must_use]
    pub fn to_hex(&self) -> &str {
        &self.value
    }

    /// Compute the checksum of a byte slice
    #[must_use]
    pub fn from_data(algorithm: ChecksumAlgorithm, data: &[u8]) -> Self {
        let mut digester = algorithm.digester();
        digester.update(data);
        Self {
            algorithm,
            value: digester.finalize_hex(),
        }
    }

    /// Compute the checksum of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, read, or if any I/O operation fails.
    pub async fn hash_file(algorithm: ChecksumAlgorithm, path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;

        let mut digester = algorithm.digester();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buffer)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, path))?;
            if n == 0 {
                break;
            }
            digester.update(&buffer[..n]);
        }

        Ok(Self {
            algorithm,
            value: digester.finalize_hex(),
        })
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.algorithm, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        let data = b"hello world";
        assert_eq!(
            Checksum::from_data(ChecksumAlgorithm::Md5, data).to_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            Checksum::from_data(ChecksumAlgorithm::Sha1, data).to_hex(),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(
            Checksum::from_data(ChecksumAlgorithm::Sha256, data).to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_algorithm_tags() {
        assert_eq!("sha".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha1);
        assert_eq!("SHA256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!("sha512".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha512);
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let upper = Checksum::parse("md5", "5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
        let computed = Checksum::from_data(ChecksumAlgorithm::Md5, b"hello world");
        assert_eq!(upper, computed);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        // sha1-sized value declared as sha256
        let result = Checksum::parse("sha256", "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_matches_report_prefix() {
        let sum = Checksum::from_data(ChecksumAlgorithm::Md5, b"hello world");
        assert_eq!(sum.to_string(), "{md5}5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_checksum_serialization() {
        let sum = Checksum::from_data(ChecksumAlgorithm::Sha256, b"test");
        let json = serde_json::to_string(&sum).unwrap();
        let deserialized: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(sum, deserialized);
    }

    #[tokio::test]
    async fn test_hash_file() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        let data = b"test file content";
        temp.write_all(data).unwrap();

        for algorithm in [ChecksumAlgorithm::Sha1, ChecksumAlgorithm::Sha384] {
            let hash = Checksum::hash_file(algorithm, temp.path()).await.unwrap();
            assert_eq!(hash, Checksum::from_data(algorithm, data));
        }
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checksum::hash_file(ChecksumAlgorithm::Sha256, &dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::PathNotFound { .. })
        ));
    }
}
