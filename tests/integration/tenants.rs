//! Tenant isolation and concurrent writers.

use crate::common::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn test_tables_are_per_tenant() {
    let t = TestDb::new();
    t.run_as("alice", json!({"op": "create", "table": "dogs"})).unwrap();
    t.run_as("bob", json!({"op": "create", "table": "cats"})).unwrap();

    match t.run_as("bob", json!({"op": "meta"})).unwrap() {
        Output::Meta(MetaInfo::Tables(tables)) => {
            assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["cats"]);
        }
        other => panic!("expected table map, got {:?}", other),
    }
}

#[test]
fn test_unique_values_do_not_cross_tenants() {
    let t = TestDb::new();
    for tenant in ["alice", "bob"] {
        t.run_as(tenant, json!({"op": "create", "table": "u", "schema": {"email": "unique string"}}))
            .unwrap();
        t.run_as(tenant, json!({"op": "insert", "table": "u", "document": {"email": "same@x"}}))
            .unwrap();
    }
}

#[test]
fn test_concurrent_writers_across_tenants() {
    let t = Arc::new(TestDb::new());
    let tenants = ["t0", "t1", "t2", "t3"];
    for tenant in tenants {
        t.run_as(tenant, json!({"op": "create", "table": "n"})).unwrap();
    }

    let handles: Vec<_> = tenants
        .iter()
        .flat_map(|tenant| (0..2).map(move |w| (*tenant, w)))
        .map(|(tenant, w)| {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for i in 0..25 {
                    t.run_as(tenant, json!({"op": "insert", "table": "n", "document": {"w": w, "i": i}}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for tenant in tenants {
        match t
            .run_as(tenant, json!({"op": "select", "table": "n", "max_results": -1}))
            .unwrap()
        {
            Output::Documents(docs) => assert_eq!(docs.len(), 50),
            other => panic!("expected documents, got {:?}", other),
        }
        t.assert_consistent(tenant);
    }
}
