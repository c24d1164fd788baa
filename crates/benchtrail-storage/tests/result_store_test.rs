//! Result store lifecycle: create, append, upsert, scan.

use benchtrail_core::errors::StorageError;
use benchtrail_core::BenchRecord;
use benchtrail_storage::{MemoryResultStore, ResultStore, SqliteResultStore};
use chrono::DateTime;

fn record(category: &str, name: &str, size: u32, git_hash: &str, secs: i64, median: f64) -> BenchRecord {
    BenchRecord {
        id: benchtrail_core::types::record_id(category, name, size, git_hash, 8),
        category: category.to_string(),
        name: name.to_string(),
        size,
        git_hash: git_hash.to_string(),
        timestamp: DateTime::from_timestamp(secs, 250_000_000).unwrap(),
        median,
        runs: 3,
    }
}

fn created_store() -> SqliteResultStore {
    let store = SqliteResultStore::open_in_memory().unwrap();
    store.create().unwrap();
    store
}

#[test]
fn scan_before_create_is_not_initialized() {
    let store = SqliteResultStore::open_in_memory().unwrap();
    assert!(matches!(store.scan(), Err(StorageError::NotInitialized)));
    assert!(matches!(store.insert(&[]), Err(StorageError::NotInitialized)));
}

#[test]
fn create_is_idempotent() {
    let store = created_store();
    store.insert(&[record("A", "x", 10, "c1c1c1c1c1", 100, 1.0)]).unwrap();
    store.create().unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn create_or_replace_empties_table() {
    let store = created_store();
    store.insert(&[record("A", "x", 10, "c1c1c1c1c1", 100, 1.0)]).unwrap();
    store.create_or_replace().unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn insert_roundtrips_all_columns() {
    let store = created_store();
    let row = record("Serialization", "encode", 4_000_000_000, "feedfacecafebeef", 1_700_000_000, 0.125);
    store.insert(std::slice::from_ref(&row)).unwrap();

    let rows = store.scan().unwrap();
    assert_eq!(rows, vec![row]);
}

#[test]
fn insert_duplicate_id_fails_whole_batch() {
    let store = created_store();
    let a = record("A", "x", 10, "c1c1c1c1c1", 100, 1.0);
    store.insert(std::slice::from_ref(&a)).unwrap();

    let b = record("A", "y", 10, "c1c1c1c1c1", 100, 1.0);
    match store.insert(&[b, a.clone()]) {
        Err(StorageError::DuplicateKey { id }) => assert_eq!(id, a.id),
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn upsert_replaces_by_id() {
    let store = created_store();
    let first = record("A", "x", 10, "c1c1c1c1c1", 100, 1.0);
    store.insert_or_replace(std::slice::from_ref(&first)).unwrap();

    let second = BenchRecord {
        median: 2.0,
        ..first.clone()
    };
    store.insert_or_replace(&[second]).unwrap();

    let rows = store.scan().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].median, 2.0);
}

#[test]
fn scan_orders_by_timestamp_then_series() {
    let store = created_store();
    store
        .insert(&[
            record("B", "x", 10, "c2c2c2c2c2", 200, 1.0),
            record("A", "y", 10, "c1c1c1c1c1", 100, 1.0),
            record("A", "x", 100, "c1c1c1c1c1", 100, 1.0),
            record("A", "x", 10, "c1c1c1c1c1", 100, 1.0),
        ])
        .unwrap();

    let keys: Vec<_> = store
        .scan()
        .unwrap()
        .iter()
        .map(|r| format!("{}/{}/{}", r.category, r.name, r.size))
        .collect();
    assert_eq!(keys, vec!["A/x/10", "A/x/100", "A/y/10", "B/x/10"]);
}

#[test]
fn scan_category_filters_exactly() {
    let store = created_store();
    store
        .insert(&[
            record("A", "x", 10, "c1c1c1c1c1", 100, 1.0),
            record("B", "x", 10, "c1c1c1c1c1", 100, 1.0),
        ])
        .unwrap();
    let rows = store.scan_category("B").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, "B");
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bench.db");
    {
        let store = SqliteResultStore::open(&path).unwrap();
        store.create().unwrap();
        store.insert(&[record("A", "x", 10, "c1c1c1c1c1", 100, 1.0)]).unwrap();
    }
    let store = SqliteResultStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn memory_store_matches_sqlite_semantics() {
    let store = MemoryResultStore::default();
    assert!(matches!(store.scan(), Err(StorageError::NotInitialized)));
    store.create().unwrap();

    let a = record("A", "x", 10, "c1c1c1c1c1", 100, 1.0);
    store.insert(std::slice::from_ref(&a)).unwrap();
    assert!(matches!(
        store.insert(std::slice::from_ref(&a)),
        Err(StorageError::DuplicateKey { .. })
    ));
    store
        .insert_or_replace(&[BenchRecord { median: 9.0, ..a }])
        .unwrap();
    let rows = store.scan().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].median, 9.0);
}
