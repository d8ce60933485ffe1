//! Core types for crumb
//!
//! This crate defines the foundational types used throughout the system:
//! - Value / Node / Document: the document data model
//! - Schema / SchemaNode / FieldSpec: schema trees and leaf specs
//! - Meta / TableMeta / Chunk: per-tenant index and chunk records
//! - Error: error type hierarchy (NotFound, Conflict, Validation, MalformedQuery, IllegalName)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod meta;
pub mod schema;
pub mod value;

pub use error::{Arity, Error, ErrorKind, QueryError, Result, ValidationError};
pub use meta::{Chunk, ChunkId, DocKey, Meta, TableMeta, ValueIndex};
pub use schema::{FieldSpec, FieldType, Schema, SchemaNode};
pub use value::{lookup, Document, Node, Value, RESERVED_KEY_FIELD};
