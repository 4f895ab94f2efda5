//! Reading possibly-compressed metadata files

use std::path::Path;

use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};
use mirrorcheck_errors::{Error, MetadataError};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Compression of a metadata file, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::Gzip,
            Some("bz2") => Self::Bzip2,
            Some("xz") => Self::Xz,
            Some("zst") => Self::Zstd,
            _ => Self::None,
        }
    }
}

/// Read a metadata file fully, decompressing it according to its extension
///
/// # Errors
/// Returns an error if the file cannot be opened or its content cannot be
/// decompressed.
pub async fn read_metadata_file(path: &Path) -> Result<Vec<u8>, Error> {
    let file = File::open(path)
        .await
        .map_err(|e| MetadataError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let reader = BufReader::new(file);

    let compression = Compression::from_path(path);
    let result = match compression {
        Compression::None => read_all(reader).await,
        Compression::Gzip => {
            let mut decoder = GzipDecoder::new(reader);
            decoder.multiple_members(true);
            read_all(decoder).await
        }
        Compression::Bzip2 => read_all(BzDecoder::new(reader)).await,
        Compression::Xz => read_all(XzDecoder::new(reader)).await,
        Compression::Zstd => read_all(ZstdDecoder::new(reader)).await,
    };

    result.map_err(|e| {
        let path = path.display().to_string();
        let message = e.to_string();
        if compression == Compression::None {
            MetadataError::Unreadable { path, message }.into()
        } else {
            MetadataError::DecompressionFailed { path, message }.into()
        }
    })
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(out)
}
