//! Foreign-key validation and expansion across tables.

use crate::common::*;
use serde_json::json;

fn setup() -> (TestDb, String) {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "owners", "schema": {"name": "string"}}))
        .unwrap();
    t.run(json!({"op": "create", "table": "dogs", "schema": {"name": "string", "owner": "foreign_key"}}))
        .unwrap();
    let owner = t.insert("owners", json!({"name": "Ranger Smith"}));
    (t, owner)
}

#[test]
fn test_dangling_reference_is_rejected() {
    let (t, _) = setup();
    let err = t
        .run(json!({"op": "insert", "table": "dogs", "document": {"name": "Yogi", "owner": "nope"}}))
        .unwrap_err();
    assert_eq!(err.category(), "validation");
}

#[test]
fn test_get_expands_reference() {
    let (t, owner) = setup();
    let dog = t.insert("dogs", json!({"name": "Yogi", "owner": owner}));

    let plain = t
        .run(json!({"op": "get", "table": "dogs", "key": dog}))
        .unwrap();
    match plain {
        Output::Document(doc) => assert_eq!(to_json(doc)["owner"], json!(owner)),
        other => panic!("expected document, got {:?}", other),
    }

    let expanded = t
        .run(json!({"op": "get", "table": "dogs", "key": dog, "expand_keys": true}))
        .unwrap();
    match expanded {
        Output::Document(doc) => assert_eq!(
            to_json(doc),
            json!({"name": "Yogi", "owner": {"name": "Ranger Smith"}, "key": dog})
        ),
        other => panic!("expected document, got {:?}", other),
    }
}

#[test]
fn test_select_expands_through_alias() {
    let (t, owner) = setup();
    t.insert("dogs", json!({"name": "Yogi", "owner": owner}));

    let found = t.select(json!({
        "op": "select",
        "table": "dogs",
        "expand_keys": true,
        "alias": {"dog": "$name", "keeper": "$owner.name"}
    }));
    assert_eq!(found, vec![json!({"dog": "Yogi", "keeper": "Ranger Smith"})]);
}

#[test]
fn test_self_reference_is_left_as_key() {
    let t = TestDb::new();
    t.run(json!({"op": "create", "table": "nodes"})).unwrap();
    let a = t.insert("nodes", json!({"label": "a"}));
    let b = t.insert("nodes", json!({"label": "b", "next": a}));
    t.run(json!({"op": "update", "table": "nodes", "key": a, "document": {"label": "a", "next": b}}))
        .unwrap();

    match t
        .run(json!({"op": "get", "table": "nodes", "key": a, "expand_keys": true}))
        .unwrap()
    {
        Output::Document(doc) => assert_eq!(
            to_json(doc),
            json!({"label": "a", "next": {"label": "b", "next": a}, "key": a})
        ),
        other => panic!("expected document, got {:?}", other),
    }
}
