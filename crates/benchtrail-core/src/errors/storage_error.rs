//! Storage errors for the result store and partition files.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Result store has not been created; run setup first")]
    NotInitialized,

    #[error("Duplicate result id '{id}'")]
    DuplicateKey { id: String },

    #[error("Invalid stored value in column {column}: {message}")]
    InvalidValue { column: String, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt partition {path} at line {line}: {message}")]
    PartitionCorrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::NotInitialized => error_code::NOT_INITIALIZED,
            Self::DuplicateKey { .. } => error_code::DUPLICATE_KEY,
            Self::PartitionCorrupt { .. } => error_code::PARTITION_CORRUPT,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
