//! # benchtrail-storage
//!
//! Persistence for aggregated benchmark rows: the [`ResultStore`] contract,
//! its SQLite implementation, and the JSON-lines partition files that
//! isolated child processes hand back to the historical sweep.

pub mod connection;
pub mod migrations;
pub mod partition;
pub mod queries;
pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteResultStore;
pub use store::{MemoryResultStore, ResultStore};
