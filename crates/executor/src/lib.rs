//! # crumb executor
//!
//! Transport-agnostic command layer for crumb, a multi-tenant embedded
//! document database. A request layer resolves the tenant, decodes a
//! [`Command`] and hands both to an [`Executor`]:
//!
//! ```text
//! use crumb_executor::{Command, Executor, Output};
//!
//! let executor = Executor::new(Database::open("/path/to/data")?);
//! let cmd: Command = serde_json::from_str(
//!     r#"{"op": "select", "table": "dogs", "where": "gt($age, 10)"}"#,
//! )?;
//! match executor.execute("alice", cmd)? {
//!     Output::Documents(docs) => println!("{} dogs", docs.len()),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! Authentication and transport stay with the caller.

#![warn(missing_docs)]

pub(crate) mod bridge;
mod command;
mod convert;
mod error;
mod executor;
mod handlers;
mod output;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API
// =============================================================================

pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;

pub use crumb_core::{Document, Node, Schema, Value};
pub use crumb_engine::{
    Alias, AliasNode, CrumbConfig, Database, MetaInfo, Order, SelectOptions, TableEdit, TableInfo,
    Where,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
