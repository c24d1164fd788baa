//! SQLite-backed [`ResultStore`].

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;
use rusqlite::Connection;

use crate::connection;
use crate::migrations;
use crate::queries::results;
use crate::store::ResultStore;

/// Result store over a single serialized SQLite connection.
///
/// Opening never creates the schema; `create` or `create_or_replace`
/// does. Every other operation on an uncreated store is `NotInitialized`.
pub struct SqliteResultStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteResultStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = connection::open_file(path)?;
        tracing::debug!(path = %path.display(), "opened result store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(connection::open_in_memory()?),
            path: None,
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rows of a single category.
    pub fn scan_category(&self, category: &str) -> Result<Vec<BenchRecord>, StorageError> {
        self.with_created(|conn| results::query_by_category(conn, category))
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::SqliteError {
            message: "connection lock poisoned".to_string(),
        })?;
        f(&guard)
    }

    fn with_created<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        self.with_conn(|conn| {
            if migrations::current_version(conn)? < migrations::LATEST_VERSION {
                return Err(StorageError::NotInitialized);
            }
            f(conn)
        })
    }
}

impl ResultStore for SqliteResultStore {
    fn create(&self) -> Result<(), StorageError> {
        self.with_conn(migrations::run_migrations)
    }

    fn create_or_replace(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            migrations::reset(conn)?;
            migrations::run_migrations(conn)?;
            tracing::info!("result store replaced");
            Ok(())
        })
    }

    fn scan(&self) -> Result<Vec<BenchRecord>, StorageError> {
        self.with_created(results::scan_all)
    }

    fn insert(&self, rows: &[BenchRecord]) -> Result<usize, StorageError> {
        self.with_created(|conn| results::insert_rows(conn, rows))
    }

    fn insert_or_replace(&self, rows: &[BenchRecord]) -> Result<usize, StorageError> {
        self.with_created(|conn| results::upsert_rows(conn, rows))
    }

    fn count(&self) -> Result<u64, StorageError> {
        self.with_created(results::count)
    }
}
