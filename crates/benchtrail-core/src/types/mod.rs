//! Row types shared by the engine, the aggregator, and storage.

pub mod record;
pub mod revision;

pub use record::{record_id, BenchRecord, RawTiming};
pub use revision::RevisionInfo;
