//! Integration tests for the file store
//!
//! - Records survive reopening the store
//! - Damaged files surface as corruption, not as missing data
//! - Tenants are isolated from each other

use std::fs;
use std::sync::Arc;
use std::thread;

use crumb_core::{Chunk, Document, Error, Meta, TableMeta};
use crumb_storage::{FileStore, RecordFormat, Store, StorePaths};
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn doc(json: serde_json::Value) -> Document {
    serde_json::from_value(json).unwrap()
}

fn open(dir: &TempDir) -> FileStore {
    FileStore::open(dir.path(), "msgpack", "identity").unwrap()
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let mut meta = Meta::new();
    let mut dogs = TableMeta::new(None);
    dogs.chunks.push("c1".into());
    meta.table_index.insert("dogs".into(), dogs);
    meta.key_index.insert("k1".into(), "c1".into());

    let mut chunk = Chunk::new();
    chunk.insert("k1".into(), doc(serde_json::json!({"name": "Yogi", "age": 12})));

    {
        let store = open(&dir);
        store.ensure_tenant("alice").unwrap();
        store.write_meta("alice", &meta).unwrap();
        store.write_chunk("alice", "c1", &chunk).unwrap();
    }

    let store = open(&dir);
    assert!(!store.ensure_tenant("alice").unwrap());
    assert_eq!(store.read_meta("alice").unwrap(), meta);
    assert_eq!(store.read_chunk("alice", "c1").unwrap(), chunk);
}

#[test]
fn test_overwrite_replaces_contents() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.ensure_tenant("alice").unwrap();

    let mut first = Chunk::new();
    first.insert("a".into(), doc(serde_json::json!({"n": 1})));
    first.insert("b".into(), doc(serde_json::json!({"n": 2})));
    store.write_chunk("alice", "c", &first).unwrap();

    let mut second = Chunk::new();
    second.insert("b".into(), doc(serde_json::json!({"n": 3})));
    store.write_chunk("alice", "c", &second).unwrap();

    assert_eq!(store.read_chunk("alice", "c").unwrap(), second);
}

// ============================================================================
// Damage
// ============================================================================

#[test]
fn test_damaged_chunk_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.ensure_tenant("alice").unwrap();
    store.write_chunk("alice", "c", &Chunk::new()).unwrap();

    let path = StorePaths::from_root(dir.path())
        .chunk_file("alice", "c")
        .unwrap();
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, bytes).unwrap();

    let err = store.read_chunk("alice", "c").unwrap_err();
    assert!(matches!(err, Error::Corruption { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn test_foreign_file_is_corruption() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.ensure_tenant("alice").unwrap();

    let path = StorePaths::from_root(dir.path()).meta_file("alice").unwrap();
    fs::write(&path, b"{\"key_index\":{}}").unwrap();

    assert!(matches!(
        store.read_meta("alice"),
        Err(Error::Corruption { .. })
    ));
}

// ============================================================================
// Tenants
// ============================================================================

#[test]
fn test_tenants_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.ensure_tenant("alice").unwrap();
    store.ensure_tenant("bob").unwrap();

    let mut chunk = Chunk::new();
    chunk.insert("k".into(), doc(serde_json::json!({"owner": "alice"})));
    store.write_chunk("alice", "shared-id", &chunk).unwrap();

    assert!(matches!(
        store.read_chunk("bob", "shared-id"),
        Err(Error::ChunkNotFound { .. })
    ));
    assert!(store.list_chunks("bob").unwrap().is_empty());

    store.delete_tenant("alice").unwrap();
    assert_eq!(store.read_meta("bob").unwrap(), Meta::new());
}

#[test]
fn test_concurrent_tenants() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open(&dir));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let tenant = format!("tenant-{}", i);
                store.ensure_tenant(&tenant).unwrap();
                for c in 0..5 {
                    let mut chunk = Chunk::new();
                    chunk.insert(format!("k{}", c), doc(serde_json::json!({"i": i, "c": c})));
                    store.write_chunk(&tenant, &format!("c{}", c), &chunk).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    for i in 0..8 {
        let chunks = store.list_chunks(&format!("tenant-{}", i)).unwrap();
        assert_eq!(chunks, vec!["c0", "c1", "c2", "c3", "c4"]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(
        "[a-z]{1,8}",
        prop_oneof![
            any::<bool>().prop_map(|b| serde_json::json!(b)),
            (-1.0e9f64..1.0e9).prop_map(|n| serde_json::json!(n)),
            "[ -~]{0,16}".prop_map(|s| serde_json::json!(s)),
            Just(serde_json::Value::Null),
        ],
        0..6,
    )
    .prop_map(|m| serde_json::from_value(serde_json::to_value(m).unwrap()).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_chunk_persists_in_either_format(
        docs in prop::collection::btree_map("[a-f0-9]{8}", arb_document(), 0..8),
        json in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let format = if json { RecordFormat::Json } else { RecordFormat::MessagePack };
        let store = FileStore::new(dir.path(), format, Box::new(crumb_storage::IdentityCodec));
        store.ensure_tenant("p").unwrap();

        let chunk: Chunk = docs;
        store.write_chunk("p", "c", &chunk).unwrap();
        prop_assert_eq!(store.read_chunk("p", "c").unwrap(), chunk);
    }
}
