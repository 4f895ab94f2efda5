#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level mirror check operation
//!
//! Wires the keyring, index resolution, catalog building and the two guard
//! scans into one run, and writes the report through a [`ReportSink`].

mod check;
mod context;
mod report;

pub use check::{run_check, RunOutcome, Stage};
pub use context::{CheckContext, CheckContextBuilder};
pub use report::{MemorySink, ReportSink, WriterSink};
