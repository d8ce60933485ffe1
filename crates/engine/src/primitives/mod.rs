//! Operations layer for crumb
//!
//! Provides the document operations as stateless facades over the Database
//! engine:
//! - **TableStore**: create, drop, edit and describe tables
//! - **DocumentStore**: insert, get, update, delete and select documents
//!
//! ## Design Principle: Stateless Facades
//!
//! Both facades hold only an `Arc<Database>` and run every call inside one
//! tenant session. Multiple instances on the same Database are safe.
//!
//! ## Tenant Isolation
//!
//! Every operation is scoped to a tenant. Tenants never share Meta, chunks
//! or locks.

pub mod document;
pub mod table;

pub use document::DocumentStore;
pub use table::{MetaInfo, TableEdit, TableInfo, TableStore};
