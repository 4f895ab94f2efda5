#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Mirror guard: the two scans over a built catalog
//!
//! [`reconcile`] walks the catalog and checks every referenced file's
//! checksum on disk. [`plan_prune`] walks the disk and classifies every
//! package file against the catalog. Both read the catalog through an
//! `Arc` and never mutate it, so they can run at the same time.

mod prune;
mod reconcile;
mod types;

pub use prune::{plan_prune, PruneOptions};
pub use reconcile::{reconcile, ReconcileOptions};
pub use types::{
    Outcome, PruneAction, PruneDecision, PruneEntry, PruneSummary, ReconcileSummary,
    VerificationResult,
};
