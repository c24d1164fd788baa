//! Queries for the bench_results table.

use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;
use chrono::DateTime;
use rusqlite::{params, Connection, ErrorCode, Row};

const SELECT_COLUMNS: &str =
    "SELECT id, category, name, size, git_hash, timestamp, median, runs FROM bench_results";

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Append rows. A row whose id already exists fails the whole batch
/// with `DuplicateKey`; nothing from the batch is kept.
pub fn insert_rows(conn: &Connection, rows: &[BenchRecord]) -> Result<usize, StorageError> {
    let tx = conn.unchecked_transaction().map_err(sqlite_err)?;
    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO bench_results
                    (id, category, name, size, git_hash, timestamp, median, runs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(sqlite_err)?;
        for row in rows {
            stmt.execute(params![
                row.id,
                row.category,
                row.name,
                row.size,
                row.git_hash,
                row.timestamp.timestamp_micros(),
                row.median,
                row.runs,
            ])
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => StorageError::DuplicateKey {
                    id: row.id.clone(),
                },
                _ => sqlite_err(e),
            })?;
        }
    }
    tx.commit().map_err(sqlite_err)?;
    Ok(rows.len())
}

/// Insert-or-replace keyed by `id`, in one transaction.
pub fn upsert_rows(conn: &Connection, rows: &[BenchRecord]) -> Result<usize, StorageError> {
    let tx = conn.unchecked_transaction().map_err(sqlite_err)?;
    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO bench_results
                    (id, category, name, size, git_hash, timestamp, median, runs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    category = excluded.category,
                    name = excluded.name,
                    size = excluded.size,
                    git_hash = excluded.git_hash,
                    timestamp = excluded.timestamp,
                    median = excluded.median,
                    runs = excluded.runs",
            )
            .map_err(sqlite_err)?;
        for row in rows {
            stmt.execute(params![
                row.id,
                row.category,
                row.name,
                row.size,
                row.git_hash,
                row.timestamp.timestamp_micros(),
                row.median,
                row.runs,
            ])
            .map_err(sqlite_err)?;
        }
    }
    tx.commit().map_err(sqlite_err)?;
    Ok(rows.len())
}

/// All rows, ordered by commit time then series.
pub fn scan_all(conn: &Connection) -> Result<Vec<BenchRecord>, StorageError> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY timestamp, category, name, size");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let mut rows = stmt.query([]).map_err(sqlite_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sqlite_err)? {
        out.push(decode_row(row)?);
    }
    Ok(out)
}

/// Rows of one category, ordered like `scan_all`.
pub fn query_by_category(conn: &Connection, category: &str) -> Result<Vec<BenchRecord>, StorageError> {
    let sql = format!("{SELECT_COLUMNS} WHERE category = ?1 ORDER BY timestamp, name, size");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let mut rows = stmt.query(params![category]).map_err(sqlite_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sqlite_err)? {
        out.push(decode_row(row)?);
    }
    Ok(out)
}

/// Count stored rows.
pub fn count(conn: &Connection) -> Result<u64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM bench_results", [], |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
        .map_err(sqlite_err)
}

fn decode_row(row: &Row<'_>) -> Result<BenchRecord, StorageError> {
    let size: i64 = row.get(3).map_err(sqlite_err)?;
    let micros: i64 = row.get(5).map_err(sqlite_err)?;
    let runs: i64 = row.get(7).map_err(sqlite_err)?;
    Ok(BenchRecord {
        id: row.get(0).map_err(sqlite_err)?,
        category: row.get(1).map_err(sqlite_err)?,
        name: row.get(2).map_err(sqlite_err)?,
        size: u32::try_from(size).map_err(|_| StorageError::InvalidValue {
            column: "size".to_string(),
            message: format!("{size} is not a u32"),
        })?,
        git_hash: row.get(4).map_err(sqlite_err)?,
        timestamp: DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            StorageError::InvalidValue {
                column: "timestamp".to_string(),
                message: format!("{micros}µs is out of range"),
            }
        })?,
        median: row.get(6).map_err(sqlite_err)?,
        runs: u32::try_from(runs).map_err(|_| StorageError::InvalidValue {
            column: "runs".to_string(),
            message: format!("{runs} is not a u32"),
        })?,
    })
}
