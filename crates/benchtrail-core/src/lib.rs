//! # benchtrail-core
//!
//! Shared foundation for the benchtrail regression harness: result row
//! types, one error enum per subsystem, layered TOML configuration,
//! tracing setup, and the cooperative cancellation token used by the
//! historical sweep.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::BenchtrailConfig;
pub use types::{BenchRecord, RawTiming, RevisionInfo};
