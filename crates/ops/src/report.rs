//! Report output
//!
//! The report is line oriented and append-only: failed files as
//! `{algorithm}checksum size path`, then orphan paths in report-only
//! prune mode.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use mirrorcheck_errors::{Error, StorageError};

/// Destination for report lines
pub trait ReportSink: Send + Sync {
    /// Append one line; the sink adds the newline.
    ///
    /// # Errors
    /// Returns an error if the line cannot be written.
    fn write_line(&self, line: &str) -> Result<(), Error>;

    /// # Errors
    /// Returns an error if buffered output cannot be written.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Sink over any writer, typically stdout or a report file
pub struct WriterSink {
    inner: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(writer)),
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Create (truncating) a report file
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, Error> {
        let file = File::create(path).map_err(|e| StorageError::from_io_with_path(&e, path))?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// `-` selects stdout, anything else is a file path
    ///
    /// # Errors
    /// Returns an error if the report file cannot be created.
    pub fn from_target(target: &str) -> Result<Self, Error> {
        if target == "-" {
            Ok(Self::stdout())
        } else {
            Self::create(Path::new(target))
        }
    }
}

impl ReportSink for WriterSink {
    fn write_line(&self, line: &str) -> Result<(), Error> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| Error::internal("report writer lock poisoned"))?;
        writeln!(writer, "{line}")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| Error::internal("report writer lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, used by tests and embedding callers
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Lines joined as they would appear in a report file
    #[must_use]
    pub fn contents(&self) -> String {
        self.lines()
            .into_iter()
            .map(|l| format!("{l}\n"))
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn write_line(&self, line: &str) -> Result<(), Error> {
        self.lines
            .lock()
            .map_err(|_| Error::internal("report buffer lock poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}
