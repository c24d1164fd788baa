//! ErrorCode trait for stable, machine-readable failure codes.

/// Every error enum implements this to expose a stable code string,
/// used in per-commit status lines and sweep reports.
pub trait ErrorCode {
    /// Returns the error code string (e.g., "SYNC_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const DISCOVERY_ERROR: &str = "DISCOVERY_ERROR";
pub const NO_BENCHMARKS: &str = "NO_BENCHMARKS";
pub const EXECUTION_ERROR: &str = "EXECUTION_ERROR";
pub const CHILD_FAILED: &str = "CHILD_FAILED";
pub const AGGREGATION_ERROR: &str = "AGGREGATION_ERROR";
pub const RESOLUTION_ERROR: &str = "RESOLUTION_ERROR";
pub const WORKTREE_ERROR: &str = "WORKTREE_ERROR";
pub const CLEANUP_ERROR: &str = "CLEANUP_ERROR";
pub const REVISION_ERROR: &str = "REVISION_ERROR";
pub const SYNC_ERROR: &str = "SYNC_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DUPLICATE_KEY: &str = "DUPLICATE_KEY";
pub const NOT_INITIALIZED: &str = "NOT_INITIALIZED";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const PARTITION_CORRUPT: &str = "PARTITION_CORRUPT";
pub const SWEEP_LOCKED: &str = "SWEEP_LOCKED";
pub const CANCELLED: &str = "CANCELLED";
pub const HISTORY_ERROR: &str = "HISTORY_ERROR";
