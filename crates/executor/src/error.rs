//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Categorised**: [`Error::category`] names the class a response layer
//!   maps to a status

use serde::{Deserialize, Serialize};

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants |
/// |----------|----------|
/// | Not Found | `TableNotFound`, `KeyNotFound`, `KeyNotInTable`, `TenantNotFound` |
/// | Conflict | `Conflict`, `TableExists` |
/// | Validation | `Validation` |
/// | Malformed query | `MalformedQuery` |
/// | Illegal name | `IllegalName` |
/// | System | `Io`, `Serialization`, `Corruption`, `Config`, `Internal` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// Table does not exist
    #[error("table not found: {table}")]
    TableNotFound { table: String },

    /// Key does not exist
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Key exists in another table
    #[error("key {key} not found in table {table}")]
    KeyNotInTable { key: String, table: String },

    /// Tenant has no metadata
    #[error("tenant not found: {tenant}")]
    TenantNotFound { tenant: String },

    // ==================== Conflict ====================
    /// Unique value already taken
    #[error("{path} already has a document with value {value}")]
    Conflict { path: String, value: String },

    /// Rename target exists
    #[error("table already exists: {table}")]
    TableExists { table: String },

    // ==================== Input ====================
    /// Document or schema rejected
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// Condition could not be parsed or evaluated
    #[error("malformed query: {reason}")]
    MalformedQuery { reason: String },

    /// Name contains a reserved character
    #[error("illegal name: {name}")]
    IllegalName { name: String },

    // ==================== System ====================
    /// I/O error
    #[error("I/O error: {reason}")]
    Io { reason: String },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Stored record failed integrity checks
    #[error("corruption: {reason}")]
    Corruption { reason: String },

    /// Configuration error
    #[error("config error: {reason}")]
    Config { reason: String },

    /// Broken internal reference
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Category name for response mapping
    pub fn category(&self) -> &'static str {
        match self {
            Error::TableNotFound { .. }
            | Error::KeyNotFound { .. }
            | Error::KeyNotInTable { .. }
            | Error::TenantNotFound { .. } => "not_found",
            Error::Conflict { .. } | Error::TableExists { .. } => "conflict",
            Error::Validation { .. } => "validation",
            Error::MalformedQuery { .. } => "malformed_query",
            Error::IllegalName { .. } => "illegal_name",
            Error::Io { .. }
            | Error::Serialization { .. }
            | Error::Corruption { .. }
            | Error::Config { .. }
            | Error::Internal { .. } => "internal",
        }
    }
}
