//! Data and configuration survive closing and reopening a directory.

use crate::common::*;
use serde_json::json;

#[test]
fn test_documents_survive_reopen() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "dogs", "schema": {"name": "unique string"}}))
        .unwrap();
    let key = t.insert("dogs", json!({"name": "Yogi"}));

    let t = t.reopen();
    match t.run(json!({"op": "get", "table": "dogs", "key": key})).unwrap() {
        Output::Document(doc) => assert_eq!(to_json(doc), json!({"name": "Yogi", "key": key})),
        other => panic!("expected document, got {:?}", other),
    }

    // Uniqueness index was persisted with the data
    let err = t
        .run(json!({"op": "insert", "table": "dogs", "document": {"name": "Yogi"}}))
        .unwrap_err();
    assert_eq!(err.category(), "conflict");
    t.assert_consistent(TENANT);
}

#[test]
fn test_config_is_picked_up_on_reopen() {
    let t = TestDb::with_config(CrumbConfig {
        format: "json".into(),
        max_documents_per_chunk: 3,
        ..CrumbConfig::default()
    });
    t.run(json!({"op": "create", "table": "t"})).unwrap();
    t.insert("t", json!({"n": 1}));

    let t = t.reopen();
    assert_eq!(t.db().config().format, "json");
    assert_eq!(t.db().config().max_documents_per_chunk, 3);
    assert_eq!(t.select(json!({"op": "select", "table": "t"})).len(), 1);
}

#[test]
fn test_failed_write_leaves_nothing_behind() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "t", "schema": {"n": "number"}}))
        .unwrap();
    let err = t
        .run(json!({"op": "bulk_insert", "table": "t", "documents": [{"n": 1}, {"n": "bad"}]}))
        .unwrap_err();
    assert_eq!(err.category(), "validation");

    let t = t.reopen();
    assert!(t.select(json!({"op": "select", "table": "t"})).is_empty());
    t.assert_consistent(TENANT);
}

#[test]
fn test_same_directory_shares_instance() {
    let t = TestDb::new();
    let again = Database::open(t.dir.path()).unwrap();
    assert!(std::sync::Arc::ptr_eq(t.db(), &again));
}
