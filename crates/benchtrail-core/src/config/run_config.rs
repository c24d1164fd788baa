//! Single-run execution configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the execution engine and aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Timed invocations per (benchmark, size). Default: 10.
    pub runs: Option<u32>,
    /// Sizes for manifest entries that declare none. Default: [100, 1000, 10000].
    pub default_sizes: Option<Vec<u64>>,
    /// Characters of the commit hash embedded in result ids. Default: 8.
    pub id_hash_len: Option<usize>,
}

impl RunConfig {
    pub fn effective_runs(&self) -> u32 {
        self.runs.unwrap_or(10)
    }

    pub fn effective_default_sizes(&self) -> Vec<u64> {
        self.default_sizes
            .clone()
            .unwrap_or_else(|| vec![100, 1_000, 10_000])
    }

    pub fn effective_id_hash_len(&self) -> usize {
        self.id_hash_len.unwrap_or(8)
    }
}
