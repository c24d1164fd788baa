//! Batch-level errors of a historical sweep.
//!
//! Per-commit failures never surface here; they are recorded in the
//! sweep report. Only conditions that stop the whole sweep do.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};
use super::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Another sweep holds the lock at {path}")]
    SweepLocked { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Sweep interrupted after {completed} of {total} commits")]
    Interrupted { completed: usize, total: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SweepLocked { .. } => error_code::SWEEP_LOCKED,
            Self::Interrupted { .. } => error_code::CANCELLED,
            Self::Storage(e) => e.error_code(),
            Self::Io { .. } => error_code::HISTORY_ERROR,
        }
    }
}
