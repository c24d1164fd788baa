//! Partition files: the per-commit hand-off between an isolated child
//! process and the parent sweep.
//!
//! One JSON object per line, each a complete [`BenchRecord`]. Files are
//! written to a temp file in the target directory and renamed into place,
//! so a partition either exists whole or not at all.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use benchtrail_core::constants::PARTITION_EXTENSION;
use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Partition file path named `stem` inside `dir`.
pub fn partition_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.{PARTITION_EXTENSION}"))
}

/// Atomically write `rows` to `path`.
pub fn write_partition(path: &Path, rows: &[BenchRecord]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err(&dir))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        for row in rows {
            serde_json::to_writer(&mut writer, row).map_err(|e| StorageError::Io {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            writer.write_all(b"\n").map_err(io_err(path))?;
        }
        writer.flush().map_err(io_err(path))?;
    }
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| StorageError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote partition");
    Ok(())
}

/// Read and validate one partition file.
pub fn read_partition(path: &Path) -> Result<Vec<BenchRecord>, StorageError> {
    let file = File::open(path).map_err(io_err(path))?;
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_err(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: BenchRecord =
            serde_json::from_str(&line).map_err(|e| StorageError::PartitionCorrupt {
                path: path.to_path_buf(),
                line: idx + 1,
                message: e.to_string(),
            })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Partition files in `dir`, sorted by file name. A missing directory has none.
pub fn list_partitions(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let pattern = dir.join(format!("*.{PARTITION_EXTENSION}"));
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| StorageError::Io {
        path: dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Read every partition in `dir`. Any corrupt file fails the whole read.
pub fn read_partitions(dir: &Path) -> Result<Vec<BenchRecord>, StorageError> {
    let mut rows = Vec::new();
    for path in list_partitions(dir)? {
        rows.extend(read_partition(&path)?);
    }
    Ok(rows)
}
