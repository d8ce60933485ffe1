//! crumbdb - multi-tenant embedded document database
//!
//! Tenants own named tables of schemaless or schema-checked documents.
//! Documents are packed into fixed-capacity chunks, unique fields are
//! tracked per tenant, and selects are written in a small condition
//! language.
//!
//! # Quick Start
//!
//! ```ignore
//! use crumbdb::{Command, Database, Executor, Output};
//!
//! let executor = Executor::new(Database::open("/path/to/data")?);
//!
//! executor.execute("alice", serde_json::from_str(
//!     r#"{"op": "create", "table": "dogs", "schema": {"name": "unique string"}}"#,
//! )?)?;
//! let output = executor.execute("alice", serde_json::from_str(
//!     r#"{"op": "insert", "table": "dogs", "document": {"name": "Yogi"}}"#,
//! )?)?;
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`], which decodes nothing and
//! stores nothing: it routes each [`Command`] to the engine for the
//! caller-resolved tenant. Storage, query and engine internals are not
//! exposed.

// Re-export the public API from crumb-executor
pub use crumb_executor::*;
