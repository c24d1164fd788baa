//! Error handling for benchtrail.
//! One error enum per subsystem, `thiserror` only.

pub mod aggregation_error;
pub mod config_error;
pub mod discovery_error;
pub mod error_code;
pub mod execution_error;
pub mod history_error;
pub mod pipeline_error;
pub mod storage_error;
pub mod sync_error;
pub mod vcs_error;

pub use aggregation_error::AggregationError;
pub use config_error::ConfigError;
pub use discovery_error::DiscoveryError;
pub use error_code::ErrorCode;
pub use execution_error::ExecutionError;
pub use history_error::HistoryError;
pub use pipeline_error::PipelineError;
pub use storage_error::StorageError;
pub use sync_error::SyncError;
pub use vcs_error::VcsError;
