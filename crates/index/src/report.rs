use std::fmt;

/// One failed file in the report: `{algorithm}checksum size path`
///
/// Algorithm and checksum are the declared values from the metadata, never
/// the recomputed digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub algorithm: String,
    pub checksum: String,
    pub size: u64,
    pub path: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}{} {} {}",
            self.algorithm, self.checksum, self.size, self.path
        )
    }
}
