//! Environment reconstruction errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors raised while rebuilding a commit's environment inside its worktree.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No build manifest found in {path}")]
    NoManifest { path: PathBuf },

    #[error("Sync command is empty")]
    EmptyCommand,

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr_tail}")]
    Failed {
        command: String,
        status: String,
        stderr_tail: String,
    },

    #[error("Sync cancelled")]
    Cancelled,
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::SYNC_ERROR,
        }
    }
}
