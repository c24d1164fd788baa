//! Aggregation errors.

use super::error_code::{self, ErrorCode};

/// Schema or grouping failures while turning raw timings into result rows.
/// Aggregation is all-or-nothing: any of these discards the whole run.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("No timing samples to aggregate")]
    Empty,

    #[error("Size {size} of {category}/{name} does not fit the u32 size column")]
    SizeOutOfRange {
        category: String,
        name: String,
        size: u64,
    },

    #[error("Invalid elapsed time {elapsed} for {category}/{name} at size {size}")]
    InvalidSample {
        category: String,
        name: String,
        size: u64,
        elapsed: f64,
    },

    #[error("Duplicate run index {run_index} for {category}/{name} at size {size}")]
    DuplicateRun {
        category: String,
        name: String,
        size: u64,
        run_index: u32,
    },

    #[error("Group {category}/{name} at size {size} has {runs} runs, exceeding the u32 runs column")]
    RunsOutOfRange {
        category: String,
        name: String,
        size: u64,
        runs: usize,
    },
}

impl ErrorCode for AggregationError {
    fn error_code(&self) -> &'static str {
        error_code::AGGREGATION_ERROR
    }
}
