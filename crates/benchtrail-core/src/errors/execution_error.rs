//! Benchmark execution errors, in-process and for the isolated child.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors that abort a whole pipeline run (or a whole commit, when raised
/// by the child launcher). No partial results survive any of these.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Benchmark {category}/{name} failed at size {size}, run {run_index}: {message}")]
    BenchmarkFailed {
        category: String,
        name: String,
        size: u64,
        run_index: u32,
        message: String,
    },

    #[error("Failed to prepare input for {category}/{name} at size {size}: {message}")]
    InputPreparation {
        category: String,
        name: String,
        size: u64,
        message: String,
    },

    #[error("Failed to spawn child process `{program}`: {source}")]
    ChildSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Child process exited with {status}: {stderr_tail}")]
    ChildFailed { status: String, stderr_tail: String },

    #[error("Child process exited successfully but wrote no partition at {path}")]
    MissingPartition { path: PathBuf },

    #[error("Execution cancelled")]
    Cancelled,
}

impl ErrorCode for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ChildSpawn { .. } | Self::ChildFailed { .. } | Self::MissingPartition { .. } => {
                error_code::CHILD_FAILED
            }
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::EXECUTION_ERROR,
        }
    }
}
