//! Partition files: write, list, read, corruption.

use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;
use benchtrail_storage::partition::*;
use chrono::DateTime;

fn record(name: &str, hash: &str) -> BenchRecord {
    BenchRecord {
        id: format!("Cat-{name}-10-{hash}"),
        category: "Cat".to_string(),
        name: name.to_string(),
        size: 10,
        git_hash: hash.to_string(),
        timestamp: DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap(),
        median: 0.001,
        runs: 5,
    }
}

#[test]
fn read_partitions_merges_all_files_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_partition(&partition_path(dir.path(), "bbbb"), &[record("y", "bbbb")]).unwrap();
    write_partition(&partition_path(dir.path(), "aaaa"), &[record("x", "aaaa")]).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let rows = read_partitions(dir.path()).unwrap();
    let hashes: Vec<_> = rows.iter().map(|r| r.git_hash.as_str()).collect();
    assert_eq!(hashes, vec!["aaaa", "bbbb"]);
}

#[test]
fn timestamps_keep_microseconds() {
    let dir = tempfile::tempdir().unwrap();
    let path = partition_path(dir.path(), "c1");
    let row = record("x", "c1");
    write_partition(&path, std::slice::from_ref(&row)).unwrap();
    assert_eq!(read_partition(&path).unwrap(), vec![row]);
}

#[test]
fn missing_directory_has_no_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let rows = read_partitions(&dir.path().join("absent")).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn malformed_line_reports_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = partition_path(dir.path(), "bad");
    let good = serde_json::to_string(&record("x", "bad")).unwrap();
    std::fs::write(&path, format!("{good}\n{{\"id\": \"only-id\"}}\n")).unwrap();

    match read_partitions(dir.path()) {
        Err(StorageError::PartitionCorrupt { path: p, line, .. }) => {
            assert_eq!(p, path);
            assert_eq!(line, 2);
        }
        other => panic!("expected PartitionCorrupt, got {other:?}"),
    }
}

#[test]
fn empty_partition_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = partition_path(dir.path(), "empty");
    write_partition(&path, &[]).unwrap();
    assert!(path.exists());
    assert!(read_partition(&path).unwrap().is_empty());
}
