//! Reconciliation and prune error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors emitted while scanning the mirror against the catalog.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum GuardError {
    /// The directory walk of the prune pass failed part way.
    #[error("error pruning: walk of {root} failed: {reason}")]
    WalkFailed { root: String, reason: String },

    /// Removing an orphan failed.
    #[error("failed to remove orphan {path}: {reason}")]
    RemoveFailed { path: String, reason: String },

    /// A worker task panicked or was cancelled.
    #[error("worker task failed during {operation}: {reason}")]
    TaskFailed { operation: String, reason: String },
}

impl UserFacingError for GuardError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::WalkFailed { .. } => {
                Some("Fix directory permissions under the repository root; a partial walk cannot be pruned safely.")
            }
            Self::RemoveFailed { .. } => Some("Check write permissions on the mirror."),
            Self::TaskFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::WalkFailed { .. } => "guard.walk_failed",
            Self::RemoveFailed { .. } => "guard.remove_failed",
            Self::TaskFailed { .. } => "guard.task_failed",
        };
        Some(code)
    }
}
