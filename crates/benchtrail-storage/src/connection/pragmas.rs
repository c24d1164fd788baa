//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, 5s busy_timeout, temp_store MEMORY.

use benchtrail_core::errors::StorageError;
use rusqlite::Connection;

/// Apply performance and safety pragmas to a connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| StorageError::SqliteError {
        message: format!("failed to apply pragmas: {e}"),
    })
}
