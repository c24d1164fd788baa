//! Historical sweep configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the historical runner.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryConfig {
    /// Commit prefix length used in worktree directory names. Default: 8.
    pub worktree_prefix_len: Option<usize>,
    /// Explicit environment sync argv. When unset the build manifest of
    /// each historical commit is detected inside its worktree.
    pub sync_command: Option<Vec<String>>,
    /// Argv prefix of the isolated child. When unset the running
    /// executable is re-invoked with the `run-partition` subcommand.
    pub child_command: Option<Vec<String>>,
    /// Keep partition files after merging. Default: false.
    pub keep_partitions: Option<bool>,
    /// Exit nonzero when any commit of a sweep failed. Default: false.
    pub fail_on_partial: Option<bool>,
}

impl HistoryConfig {
    pub fn effective_worktree_prefix_len(&self) -> usize {
        self.worktree_prefix_len.unwrap_or(8)
    }

    pub fn effective_keep_partitions(&self) -> bool {
        self.keep_partitions.unwrap_or(false)
    }

    pub fn effective_fail_on_partial(&self) -> bool {
        self.fail_on_partial.unwrap_or(false)
    }
}
