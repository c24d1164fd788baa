//! Result store location.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_DB_FILE};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory, relative to the project root unless absolute.
    /// Default: `.benchtrail`.
    pub data_dir: Option<String>,
    /// Database file name inside the data directory. Default: `bench.db`.
    pub db_file: Option<String>,
}

impl StorageConfig {
    /// Resolve the data directory against `root`.
    pub fn effective_data_dir(&self, root: &Path) -> PathBuf {
        let dir = self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR);
        root.join(dir)
    }

    /// Resolve the database path against `root`.
    pub fn effective_db_path(&self, root: &Path) -> PathBuf {
        self.effective_data_dir(root)
            .join(self.db_file.as_deref().unwrap_or(DEFAULT_DB_FILE))
    }
}
