//! Version-control errors: reference resolution, worktrees, revision metadata.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors reported by the version-control collaborator.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("Cannot resolve reference '{reference}': {message}")]
    Resolve { reference: String, message: String },

    #[error("Cannot create worktree at {path} for {commit}: {message}")]
    WorktreeCreate {
        path: PathBuf,
        commit: String,
        message: String,
    },

    #[error("Cannot remove worktree at {path}: {message}")]
    WorktreeRemove { path: PathBuf, message: String },

    #[error("Cannot read revision metadata in {path}: {message}")]
    Revision { path: PathBuf, message: String },

    #[error("Failed to run git: {source}")]
    Spawn { source: std::io::Error },
}

impl ErrorCode for VcsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => error_code::RESOLUTION_ERROR,
            Self::WorktreeCreate { .. } | Self::Spawn { .. } => error_code::WORKTREE_ERROR,
            Self::WorktreeRemove { .. } => error_code::CLEANUP_ERROR,
            Self::Revision { .. } => error_code::REVISION_ERROR,
        }
    }
}
