//! Benchmark discovery errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors raised while walking a benchmark root and loading manifests.
/// Any of these aborts discovery as a whole.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Benchmark root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid benchmark manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Unknown kernel '{kernel}' for {category}/{name} in {path}")]
    UnknownKernel {
        path: PathBuf,
        category: String,
        name: String,
        kernel: String,
    },
}

impl ErrorCode for DiscoveryError {
    fn error_code(&self) -> &'static str {
        error_code::DISCOVERY_ERROR
    }
}
