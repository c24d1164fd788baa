//! # benchtrail-bench
//!
//! Performance-regression harness. Runs timed micro-benchmarks declared in
//! TOML manifests, aggregates the samples into per-size medians stamped
//! with the checkout's commit, and replays the *current* benchmark suite
//! against historical commits to build a time series.
//!
//! - [`registry`] / [`discovery`]: descriptors and how manifests populate them
//! - [`engine`]: timed execution over deterministic [`fixtures`]
//! - [`stats`]: grouping, medians, result rows
//! - [`pipeline`]: discover → filter → execute → aggregate for one checkout
//! - [`history`]: one isolated worktree and child process per commit,
//!   then an idempotent merge into the result store

pub mod discovery;
pub mod engine;
pub mod fixtures;
pub mod history;
pub mod launcher;
pub mod pipeline;
pub mod process;
pub mod registry;
pub mod report;
pub mod stats;
pub mod sync;
pub mod vcs;
pub mod workload;

pub use pipeline::{run_pipeline, PipelineContext, PipelineOptions};
pub use registry::{BenchmarkDescriptor, Registry};
