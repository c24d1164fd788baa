//! Raw timing samples and aggregated result rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::revision::short_prefix;
use crate::constants::ID_SEPARATOR;

/// One timed invocation of a benchmark. Produced by the execution engine,
/// consumed only by the aggregator; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTiming {
    pub category: String,
    pub name: String,
    pub size: u64,
    /// 0-based, unique within a (category, name, size) group.
    pub run_index: u32,
    /// Elapsed wall-clock seconds, measured with a monotonic clock.
    pub elapsed: f64,
}

/// One aggregated result row: the canonical storage and partition schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRecord {
    /// Primary key, see [`record_id`].
    pub id: String,
    pub category: String,
    pub name: String,
    pub size: u32,
    pub git_hash: String,
    pub timestamp: DateTime<Utc>,
    pub median: f64,
    pub runs: u32,
}

impl BenchRecord {
    /// The (category, name, size) series this row belongs to.
    pub fn series_key(&self) -> (&str, &str, u32) {
        (&self.category, &self.name, self.size)
    }
}

/// Deterministic row id: `category-name-size-<first hash_len chars of git_hash>`.
///
/// Two runs against the same commit, category, name, and size always yield
/// the same id, so upserting them collides instead of duplicating.
pub fn record_id(category: &str, name: &str, size: u32, git_hash: &str, hash_len: usize) -> String {
    let sep = ID_SEPARATOR;
    format!(
        "{category}{sep}{name}{sep}{size}{sep}{}",
        short_prefix(git_hash, hash_len)
    )
}
