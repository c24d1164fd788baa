//! Configuration system for benchtrail.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod benchtrail_config;
pub mod history_config;
pub mod run_config;
pub mod storage_config;

pub use benchtrail_config::{BenchtrailConfig, CliOverrides};
pub use history_config::HistoryConfig;
pub use run_config::RunConfig;
pub use storage_config::StorageConfig;
