//! Single-tenant lifecycle: create, insert, select, delete, drop.

use crate::common::*;
use crumb_storage::Store;
use serde_json::json;

#[test]
fn test_full_lifecycle() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "t", "schema": {"name": "string", "age": "number"}}))
        .unwrap();
    let key = t.insert("t", json!({"name": "Yogi", "age": 12}));

    let found = t.select(json!({"op": "select", "table": "t", "where": "eq($name, 'Yogi')"}));
    assert_eq!(found, vec![json!({"name": "Yogi", "age": 12})]);

    t.run(json!({"op": "delete", "table": "t", "key": key})).unwrap();
    assert!(t.select(json!({"op": "select", "table": "t"})).is_empty());

    t.run(json!({"op": "drop", "table": "t"})).unwrap();
    let err = t
        .run(json!({"op": "get", "table": "t", "key": key}))
        .unwrap_err();
    assert_eq!(err, Error::TableNotFound { table: "t".into() });
    t.assert_consistent(TENANT);
}

#[test]
fn test_get_returns_inserted_document() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "t", "schema": {
        "name": "string",
        "address": {"city": "string", "zip": "nullable number"},
        "alive": "boolean"
    }}))
    .unwrap();
    let input = json!({"name": "Boo", "address": {"city": "Jellystone", "zip": null}, "alive": true});
    let key = t.insert("t", input.clone());

    let mut expected = input;
    expected["key"] = json!(key);
    match t.run(json!({"op": "get", "table": "t", "key": key})).unwrap() {
        Output::Document(doc) => assert_eq!(to_json(doc), expected),
        other => panic!("expected document, got {:?}", other),
    }
}

#[test]
fn test_schema_fields_are_order_independent() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "t", "schema": {"a": "string", "b": "number"}}))
        .unwrap();
    let doc: Document = serde_json::from_str(r#"{"b": 1, "a": "x"}"#).unwrap();
    let out = t
        .executor
        .execute(
            TENANT,
            Command::Insert {
                table: "t".into(),
                document: doc,
            },
        )
        .unwrap();
    assert!(matches!(out, Output::Key(_)));

    let err = t.run(json!({"op": "insert", "table": "t", "document": {"a": "x"}})).unwrap_err();
    assert_eq!(err.category(), "validation");
}

#[test]
fn test_select_order_and_limit() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "dogs"})).unwrap();
    for (name, age) in [("a", 13), ("b", 13), ("c", 14), ("d", 15), ("e", 16)] {
        t.insert("dogs", json!({"name": name, "age": age}));
    }

    let oldest = t.select(json!({
        "op": "select", "table": "dogs", "max_results": 1,
        "order": {"by": "$age", "descending": true}
    }));
    assert_eq!(oldest, vec![json!({"name": "e", "age": 16})]);

    let youngest = t.select(json!({
        "op": "select", "table": "dogs", "max_results": 1,
        "order": {"by": "$age"}
    }));
    assert_eq!(youngest[0]["age"], json!(13));

    let none = t.select(json!({"op": "select", "table": "dogs", "max_results": 0}));
    assert!(none.is_empty());
    let all = t.select(json!({"op": "select", "table": "dogs", "max_results": -1}));
    assert_eq!(all.len(), 5);
    let ordered = t.select(json!({
        "op": "select", "table": "dogs", "max_results": 0,
        "order": {"by": "$age"}
    }));
    assert_eq!(ordered.len(), 5);
}

#[test]
fn test_condition_language_through_select() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "t"})).unwrap();
    t.insert("t", json!({"n": 1}));

    for condition in [
        "eq(add(1,2,3), 6)",
        "eq(divide(10,0), null)",
        "eq(to_date_string(1668304518135), 'Sun, 13 Nov 2022 01:55:18 GMT')",
        "eq(sec(0), 1)",
        "eq(csc(0), null)",
    ] {
        let found = t.select(json!({"op": "select", "table": "t", "where": condition}));
        assert_eq!(found.len(), 1, "{} should match", condition);
    }
}

#[test]
fn test_deleting_everything_releases_chunks() {
    let t = TestDb::with_config(CrumbConfig {
        max_documents_per_chunk: 2,
        ..CrumbConfig::default()
    });
    t.run(json!({"op": "create", "table": "t", "schema": {"code": "unique number"}}))
        .unwrap();
    let docs: Vec<_> = (0..7).map(|i| json!({"code": i})).collect();
    t.run(json!({"op": "bulk_insert", "table": "t", "documents": docs}))
        .unwrap();
    assert_eq!(t.db().store().list_chunks(TENANT).unwrap().len(), 4);

    let deleted = t
        .run(json!({"op": "delete_where", "table": "t", "where": ""}))
        .unwrap();
    assert_eq!(deleted, Output::Count(7));

    assert!(t.db().store().list_chunks(TENANT).unwrap().is_empty());
    let meta = t.db().store().read_meta(TENANT).unwrap();
    assert!(meta.key_index.is_empty());
    assert!(meta.table_index["t"].chunks.is_empty());
    assert!(meta.row_index.is_empty());
    t.assert_consistent(TENANT);
}

#[test]
fn test_update_uniqueness() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "u", "schema": {"email": "unique string"}}))
        .unwrap();
    let a = t.insert("u", json!({"email": "a@x"}));
    t.insert("u", json!({"email": "b@x"}));

    let err = t
        .run(json!({"op": "update", "table": "u", "key": a, "document": {"email": "b@x"}}))
        .unwrap_err();
    assert_eq!(err.category(), "conflict");

    t.run(json!({"op": "update", "table": "u", "key": a, "document": {"email": "a@x"}}))
        .unwrap();
    t.assert_consistent(TENANT);
}
