//! The persistence contract the pipeline and the historical sweep write to.

use std::sync::Mutex;

use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;

/// Opaque table of aggregated result rows, keyed by `BenchRecord::id`.
pub trait ResultStore {
    /// Create the table if it does not exist yet.
    fn create(&self) -> Result<(), StorageError>;

    /// Drop any existing table and create an empty one.
    fn create_or_replace(&self) -> Result<(), StorageError>;

    /// Every stored row, ordered by timestamp, category, name, size.
    fn scan(&self) -> Result<Vec<BenchRecord>, StorageError>;

    /// Append rows; an existing id fails the whole batch.
    fn insert(&self, rows: &[BenchRecord]) -> Result<usize, StorageError>;

    /// Upsert rows keyed by id.
    fn insert_or_replace(&self, rows: &[BenchRecord]) -> Result<usize, StorageError>;

    /// Number of stored rows.
    fn count(&self) -> Result<u64, StorageError> {
        self.scan().map(|rows| rows.len() as u64)
    }
}

/// In-process store, used for dry runs and as a test double.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    rows: Mutex<Option<Vec<BenchRecord>>>,
}

impl MemoryResultStore {
    /// A store that has already been created.
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Some(Vec::new())),
        }
    }

    fn with_rows<T>(
        &self,
        f: impl FnOnce(&mut Vec<BenchRecord>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self.rows.lock().map_err(|_| StorageError::SqliteError {
            message: "memory store lock poisoned".to_string(),
        })?;
        match guard.as_mut() {
            Some(rows) => f(rows),
            None => Err(StorageError::NotInitialized),
        }
    }
}

impl ResultStore for MemoryResultStore {
    fn create(&self) -> Result<(), StorageError> {
        let mut guard = self.rows.lock().map_err(|_| StorageError::SqliteError {
            message: "memory store lock poisoned".to_string(),
        })?;
        guard.get_or_insert_with(Vec::new);
        Ok(())
    }

    fn create_or_replace(&self) -> Result<(), StorageError> {
        let mut guard = self.rows.lock().map_err(|_| StorageError::SqliteError {
            message: "memory store lock poisoned".to_string(),
        })?;
        *guard = Some(Vec::new());
        Ok(())
    }

    fn scan(&self) -> Result<Vec<BenchRecord>, StorageError> {
        self.with_rows(|rows| {
            let mut out = rows.clone();
            out.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.series_key().cmp(&b.series_key()))
            });
            Ok(out)
        })
    }

    fn insert(&self, new_rows: &[BenchRecord]) -> Result<usize, StorageError> {
        self.with_rows(|rows| {
            let mut seen: std::collections::HashSet<&str> =
                rows.iter().map(|r| r.id.as_str()).collect();
            for row in new_rows {
                if !seen.insert(row.id.as_str()) {
                    return Err(StorageError::DuplicateKey { id: row.id.clone() });
                }
            }
            rows.extend_from_slice(new_rows);
            Ok(new_rows.len())
        })
    }

    fn insert_or_replace(&self, new_rows: &[BenchRecord]) -> Result<usize, StorageError> {
        self.with_rows(|rows| {
            for row in new_rows {
                match rows.iter_mut().find(|r| r.id == row.id) {
                    Some(existing) => *existing = row.clone(),
                    None => rows.push(row.clone()),
                }
            }
            Ok(new_rows.len())
        })
    }
}
