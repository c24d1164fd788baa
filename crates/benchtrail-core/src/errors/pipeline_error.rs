//! Single-run pipeline errors.

use super::error_code::{self, ErrorCode};
use super::{AggregationError, DiscoveryError, ExecutionError, StorageError, VcsError};

/// Errors that can occur during one pass of the single-run pipeline.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No benchmarks matched (category filter: {filter:?})")]
    NoBenchmarks { filter: Option<String> },

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Revision error: {0}")]
    Revision(#[from] VcsError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoBenchmarks { .. } => error_code::NO_BENCHMARKS,
            Self::Discovery(e) => e.error_code(),
            Self::Execution(e) => e.error_code(),
            Self::Aggregation(e) => e.error_code(),
            Self::Revision(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
