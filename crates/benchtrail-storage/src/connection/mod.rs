//! Connection management.

pub mod pragmas;

use std::path::Path;

use benchtrail_core::errors::StorageError;
use rusqlite::Connection;

use self::pragmas::apply_pragmas;

/// Open a database file, creating its parent directory, and apply pragmas.
pub fn open_file(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    let conn = Connection::open(path).map_err(|e| StorageError::SqliteError {
        message: format!("open {}: {e}", path.display()),
    })?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing and dry runs).
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory().map_err(|e| StorageError::SqliteError {
        message: e.to_string(),
    })?;
    apply_pragmas(&conn)?;
    Ok(conn)
}
