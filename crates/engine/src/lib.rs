//! Database engine for crumb
//!
//! This crate orchestrates the lower layers:
//! - Database: open/close, configuration and per-tenant locking
//! - Session: staged Meta and chunk writes for one operation
//! - Schema validation and uniqueness index maintenance
//! - Foreign-key expansion, alias projection and the select pipeline
//! - TableStore / DocumentStore: the document operations
//!
//! The engine is the only component that knows how Meta, chunks and the
//! condition language fit together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod expand;
pub mod index;
pub mod integrity;
pub mod primitives;
pub mod select;
pub mod session;
pub mod validate;

pub use database::{CrumbConfig, Database, CONFIG_FILE_NAME, OPEN_DATABASES};
pub use expand::{expand, Alias, AliasNode, Projection};
pub use integrity::{verify_integrity, IntegrityReport, Violation};
pub use primitives::{DocumentStore, MetaInfo, TableEdit, TableInfo, TableStore};
pub use select::{Filter, Order, SelectOptions, Where};
pub use session::{DocumentSource, Session};
pub use validate::{validate_document, validate_schema};
