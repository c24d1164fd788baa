//! Compiled constants shared across crates.

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "benchtrail.toml";

/// Directory under `$HOME` holding the user-level config.
pub const USER_CONFIG_DIR: &str = ".benchtrail";

/// Default data directory, relative to the project root.
pub const DEFAULT_DATA_DIR: &str = ".benchtrail";

/// Default SQLite file name inside the data directory.
pub const DEFAULT_DB_FILE: &str = "bench.db";

/// Environment variable read by `init_tracing`.
pub const LOG_ENV_VAR: &str = "BENCHTRAIL_LOG";

/// Entries under a discovery root are picked up when their lowercased
/// name starts with this prefix.
pub const BENCH_PREFIX: &str = "bench";

/// Extension of benchmark manifest files.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Extension of partition files written by child processes.
pub const PARTITION_EXTENSION: &str = "jsonl";

/// Separator between the components of a record id.
pub const ID_SEPARATOR: char = '-';

/// Name of the hidden subcommand a historical child process runs.
pub const CHILD_SUBCOMMAND: &str = "run-partition";

/// Lock file preventing concurrent sweeps over the same data directory.
pub const SWEEP_LOCK_FILE: &str = "sweep.lock";

/// Subdirectory of the data directory holding per-commit worktrees.
pub const WORKTREES_DIR: &str = "worktrees";

/// Maximum number of trailing stderr bytes kept in child failure errors.
pub const STDERR_TAIL_BYTES: usize = 2048;
