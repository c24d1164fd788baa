//! Top-level benchtrail configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{HistoryConfig, RunConfig, StorageConfig};
use crate::constants::{PROJECT_CONFIG_FILE, USER_CONFIG_DIR};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`BENCHTRAIL_*`)
/// 3. Project config (`benchtrail.toml` in project root)
/// 4. User config (`~/.benchtrail/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BenchtrailConfig {
    pub run: RunConfig,
    pub history: HistoryConfig,
    pub storage: StorageConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub runs: Option<u32>,
    pub data_dir: Option<String>,
    pub fail_on_partial: Option<bool>,
}

impl BenchtrailConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &BenchtrailConfig) -> Result<(), ConfigError> {
        if config.run.runs == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "run.runs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(sizes) = &config.run.default_sizes {
            if sizes.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "run.default_sizes".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if sizes.iter().any(|&s| s > u64::from(u32::MAX)) {
                return Err(ConfigError::ValidationFailed {
                    field: "run.default_sizes".to_string(),
                    message: "sizes must fit in u32".to_string(),
                });
            }
        }
        if let Some(len) = config.run.id_hash_len {
            if !(1..=40).contains(&len) {
                return Err(ConfigError::ValidationFailed {
                    field: "run.id_hash_len".to_string(),
                    message: "must be between 1 and 40".to_string(),
                });
            }
        }
        if let Some(len) = config.history.worktree_prefix_len {
            if !(4..=40).contains(&len) {
                return Err(ConfigError::ValidationFailed {
                    field: "history.worktree_prefix_len".to_string(),
                    message: "must be between 4 and 40".to_string(),
                });
            }
        }
        for (field, argv) in [
            ("history.sync_command", &config.history.sync_command),
            ("history.child_command", &config.history.child_command),
        ] {
            if matches!(argv, Some(v) if v.is_empty()) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must contain at least a program".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut BenchtrailConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: BenchtrailConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut BenchtrailConfig, other: &BenchtrailConfig) {
        // Run
        if other.run.runs.is_some() {
            base.run.runs = other.run.runs;
        }
        if other.run.default_sizes.is_some() {
            base.run.default_sizes = other.run.default_sizes.clone();
        }
        if other.run.id_hash_len.is_some() {
            base.run.id_hash_len = other.run.id_hash_len;
        }

        // History
        if other.history.worktree_prefix_len.is_some() {
            base.history.worktree_prefix_len = other.history.worktree_prefix_len;
        }
        if other.history.sync_command.is_some() {
            base.history.sync_command = other.history.sync_command.clone();
        }
        if other.history.child_command.is_some() {
            base.history.child_command = other.history.child_command.clone();
        }
        if other.history.keep_partitions.is_some() {
            base.history.keep_partitions = other.history.keep_partitions;
        }
        if other.history.fail_on_partial.is_some() {
            base.history.fail_on_partial = other.history.fail_on_partial;
        }

        // Storage
        if other.storage.data_dir.is_some() {
            base.storage.data_dir = other.storage.data_dir.clone();
        }
        if other.storage.db_file.is_some() {
            base.storage.db_file = other.storage.db_file.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `BENCHTRAIL_RUNS`, `BENCHTRAIL_DATA_DIR`, etc.
    fn apply_env_overrides(config: &mut BenchtrailConfig) {
        if let Ok(val) = std::env::var("BENCHTRAIL_RUNS") {
            if let Ok(v) = val.parse::<u32>() {
                config.run.runs = Some(v);
            }
        }
        if let Ok(val) = std::env::var("BENCHTRAIL_DEFAULT_SIZES") {
            let parsed: Result<Vec<u64>, _> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<u64>)
                .collect();
            if let Ok(sizes) = parsed {
                if !sizes.is_empty() {
                    config.run.default_sizes = Some(sizes);
                }
            }
        }
        if let Ok(val) = std::env::var("BENCHTRAIL_ID_HASH_LEN") {
            if let Ok(v) = val.parse::<usize>() {
                config.run.id_hash_len = Some(v);
            }
        }
        if let Ok(val) = std::env::var("BENCHTRAIL_DATA_DIR") {
            if !val.is_empty() {
                config.storage.data_dir = Some(val);
            }
        }
        if let Ok(val) = std::env::var("BENCHTRAIL_FAIL_ON_PARTIAL") {
            if let Ok(v) = val.parse::<bool>() {
                config.history.fail_on_partial = Some(v);
            }
        }
        if let Ok(val) = std::env::var("BENCHTRAIL_KEEP_PARTITIONS") {
            if let Ok(v) = val.parse::<bool>() {
                config.history.keep_partitions = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut BenchtrailConfig, cli: &CliOverrides) {
        if let Some(v) = cli.runs {
            config.run.runs = Some(v);
        }
        if let Some(ref v) = cli.data_dir {
            config.storage.data_dir = Some(v.clone());
        }
        if let Some(v) = cli.fail_on_partial {
            config.history.fail_on_partial = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns the user config path: `~/.benchtrail/config.toml`.
fn user_config_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(USER_CONFIG_DIR).join("config.toml"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
