//! Tests for Store
//!
//! These tests verify:
//! - Set/get round trips, overwrites and key isolation
//! - Not-found conditions for keys and buckets
//! - List surfaces raw keys, never digests
//! - Command execution
//! - Store lifecycle (open/close, paths)

use std::collections::BTreeSet;
use std::path::PathBuf;

use kv::store::{hash_key, KEY_BUCKET, VALUE_BUCKET};
use kv::{Command, Config, KvError, Reply, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("kv.db"))
        .build();
    let store = Store::open(&config).unwrap();
    (temp_dir, store)
}

fn key_set(keys: Vec<Vec<u8>>) -> BTreeSet<Vec<u8>> {
    keys.into_iter().collect()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_backing_file_but_not_lock() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("kv.db");

    let store = Store::open_path(&db_path).unwrap();

    assert!(db_path.exists());
    assert_eq!(store.db_path(), db_path.as_path());
    assert_eq!(store.lock_path(), temp_dir.path().join("kv.db.lock").as_path());
    assert!(!store.lock_path().exists());
}

#[test]
fn test_set_creates_lock_file() {
    let (_temp, store) = setup_temp_store();

    store.set(b"a", b"1").unwrap();

    assert!(store.lock_path().exists());
}

#[test]
fn test_open_fails_in_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let db_path: PathBuf = temp_dir.path().join("no").join("such").join("kv.db");

    assert!(matches!(Store::open_path(&db_path), Err(KvError::Io(_))));
}

#[test]
fn test_close_and_reopen_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("kv.db");

    let store = Store::open_path(&db_path).unwrap();
    store.set(b"persist", b"me").unwrap();
    store.close().unwrap();

    let store = Store::open_path(&db_path).unwrap();
    assert_eq!(store.get(b"persist").unwrap(), b"me".to_vec());
}

// =============================================================================
// Set / Get Tests
// =============================================================================

#[test]
fn test_set_get_round_trip() {
    let (_temp, store) = setup_temp_store();

    store.set(b"hello", b"world").unwrap();

    assert_eq!(store.get(b"hello").unwrap(), b"world".to_vec());
}

#[test]
fn test_empty_value_round_trips() {
    let (_temp, store) = setup_temp_store();

    store.set(b"empty", b"").unwrap();

    assert_eq!(store.get(b"empty").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_binary_and_large_keys() {
    let (_temp, store) = setup_temp_store();
    let big_key = vec![b'x'; 64 * 1024];
    let binary_key = vec![0u8, 255, 10, 13, 0];

    store.set(&big_key, b"big").unwrap();
    store.set(&binary_key, b"bin").unwrap();

    assert_eq!(store.get(&big_key).unwrap(), b"big".to_vec());
    assert_eq!(store.get(&binary_key).unwrap(), b"bin".to_vec());
}

#[test]
fn test_no_cross_key_interference() {
    let (_temp, store) = setup_temp_store();

    // Shared prefixes and equal lengths
    store.set(b"user", b"1").unwrap();
    store.set(b"user:1", b"2").unwrap();
    store.set(b"user:2", b"3").unwrap();
    store.set(b"resu", b"4").unwrap();

    assert_eq!(store.get(b"user").unwrap(), b"1".to_vec());
    assert_eq!(store.get(b"user:1").unwrap(), b"2".to_vec());
    assert_eq!(store.get(b"user:2").unwrap(), b"3".to_vec());
    assert_eq!(store.get(b"resu").unwrap(), b"4".to_vec());
}

#[test]
fn test_overwrite_last_write_wins() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", b"value1").unwrap();
    store.set(b"key", b"value2").unwrap();

    assert_eq!(store.get(b"key").unwrap(), b"value2".to_vec());
    assert_eq!(store.list().unwrap(), vec![b"key".to_vec()]);
}

#[test]
fn test_repeated_set_is_idempotent() {
    let (_temp_once, once) = setup_temp_store();
    let (_temp_twice, twice) = setup_temp_store();

    once.set(b"k", b"v").unwrap();
    twice.set(b"k", b"v").unwrap();
    twice.set(b"k", b"v").unwrap();

    assert_eq!(once.get(b"k").unwrap(), twice.get(b"k").unwrap());
    assert_eq!(once.list().unwrap(), twice.list().unwrap());
}

#[test]
fn test_get_unset_key_is_not_found() {
    let (_temp, store) = setup_temp_store();
    store.set(b"present", b"1").unwrap();

    assert!(matches!(store.get(b"absent"), Err(KvError::KeyNotFound)));
}

#[test]
fn test_get_on_fresh_store_is_bucket_not_found() {
    let (_temp, store) = setup_temp_store();

    match store.get(b"anything") {
        Err(KvError::BucketNotFound(name)) => assert_eq!(name, "kv"),
        other => panic!("expected BucketNotFound, got {:?}", other),
    }
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_on_fresh_store_is_bucket_not_found() {
    let (_temp, store) = setup_temp_store();

    match store.list() {
        Err(KvError::BucketNotFound(name)) => assert_eq!(name, "k"),
        other => panic!("expected BucketNotFound, got {:?}", other),
    }
}

#[test]
fn test_list_returns_exactly_the_raw_keys() {
    let (_temp, store) = setup_temp_store();
    let expected: BTreeSet<Vec<u8>> = (0..25).map(|i| format!("key-{}", i).into_bytes()).collect();

    for key in &expected {
        store.set(key, b"v").unwrap();
    }

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), expected.len());
    assert_eq!(key_set(listed.clone()), expected);

    // Never digests
    for key in &listed {
        assert_ne!(key, &hash_key(key).as_bytes().to_vec());
        assert!(!listed.contains(&hash_key(key).as_bytes().to_vec()));
    }
}

#[test]
fn test_buckets_stay_consistent() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("kv.db");
    let store = Store::open_path(&db_path).unwrap();
    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();
    store.close().unwrap();

    // Every digest in the value table has a raw key mapping to it
    let db = kv::db::Db::open(&db_path, true).unwrap();
    db.view(|tx| {
        let keys = tx.bucket(KEY_BUCKET).unwrap();
        let values = tx.bucket(VALUE_BUCKET).unwrap();
        assert_eq!(keys.len(), values.len());
        for (digest, _) in values.iter() {
            assert!(keys.iter().any(|(_, d)| d == digest));
        }
        for (raw, digest) in keys.iter() {
            assert_eq!(digest, hash_key(raw).as_bytes());
        }
        Ok(())
    })
    .unwrap();
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_alpha_beta_gamma() {
    let (_temp, store) = setup_temp_store();

    store.set(b"alpha", b"1").unwrap();
    store.set(b"beta", b"2").unwrap();

    assert_eq!(
        key_set(store.list().unwrap()),
        key_set(vec![b"alpha".to_vec(), b"beta".to_vec()])
    );
    assert_eq!(store.get(b"alpha").unwrap(), b"1".to_vec());
    assert!(matches!(store.get(b"gamma"), Err(KvError::KeyNotFound)));
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_routes_commands() {
    let (_temp, store) = setup_temp_store();

    let reply = store
        .execute(Command::Set {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        })
        .unwrap();
    assert_eq!(reply, Reply::Done);

    let reply = store.execute(Command::Get { key: b"k".to_vec() }).unwrap();
    assert_eq!(reply, Reply::Value(b"v".to_vec()));

    let reply = store.execute(Command::List).unwrap();
    assert_eq!(reply, Reply::Keys(vec![b"k".to_vec()]));
}

#[test]
fn test_execute_surfaces_errors() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(
        store.execute(Command::Get { key: b"k".to_vec() }),
        Err(KvError::BucketNotFound(_))
    ));
}
