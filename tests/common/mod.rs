//! Shared test utilities for the integration suite.
//!
//! Import via `mod common;` from the suite's main.rs.

#![allow(dead_code)]

use std::sync::Arc;

pub use crumbdb::{Command, CrumbConfig, Database, Document, Error, Executor, MetaInfo, Output};
use serde_json::Value as Json;
use tempfile::TempDir;

/// Default tenant for single-tenant tests
pub const TENANT: &str = "alice";

// ============================================================================
// TestDb - executor over a file-backed database
// ============================================================================

/// Executor over a database in its own temporary directory.
pub struct TestDb {
    pub executor: Executor,
    pub dir: TempDir,
}

impl TestDb {
    /// Create a new test database with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CrumbConfig::default())
    }

    /// Create a new test database with `cfg`.
    pub fn with_config(cfg: CrumbConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = Database::open_with_config(dir.path(), cfg).expect("Failed to open database");
        TestDb {
            executor: Executor::new(db),
            dir,
        }
    }

    /// Drop the current instance and open the same directory again.
    pub fn reopen(self) -> Self {
        let TestDb { executor, dir } = self;
        drop(executor);
        let db = Database::open(dir.path()).expect("Failed to reopen database");
        TestDb {
            executor: Executor::new(db),
            dir,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        self.executor.database()
    }

    /// Run a JSON-encoded command for `tenant`.
    pub fn run_as(&self, tenant: &str, cmd: Json) -> crumbdb::Result<Output> {
        let cmd: Command = serde_json::from_value(cmd).expect("Failed to decode command");
        self.executor.execute(tenant, cmd)
    }

    /// Run a JSON-encoded command for [`TENANT`].
    pub fn run(&self, cmd: Json) -> crumbdb::Result<Output> {
        self.run_as(TENANT, cmd)
    }

    /// Insert a document and return its key.
    pub fn insert(&self, table: &str, document: Json) -> String {
        match self.run(serde_json::json!({"op": "insert", "table": table, "document": document})) {
            Ok(Output::Key(key)) => key,
            other => panic!("insert failed: {:?}", other),
        }
    }

    /// Select and return the documents as JSON.
    pub fn select(&self, cmd: Json) -> Vec<Json> {
        match self.run(cmd) {
            Ok(Output::Documents(docs)) => docs.into_iter().map(to_json).collect(),
            other => panic!("select failed: {:?}", other),
        }
    }

    /// Assert the tenant's metadata and chunks agree.
    pub fn assert_consistent(&self, tenant: &str) {
        let report = crumb_engine::verify_integrity(self.db(), tenant).expect("integrity check failed");
        assert!(report.is_clean(), "{:?}", report.violations);
    }
}

/// Convert a document to JSON
pub fn to_json(document: Document) -> Json {
    serde_json::to_value(document).expect("Failed to encode document")
}
