//! Error types for crumb
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors carry structured context (table, key, field, expected/actual);
//! message text exists only in the `Display` impls.
//!
//! # Categories
//!
//! | Kind | Variants |
//! |------|----------|
//! | NotFound | `TableNotFound`, `KeyNotFound`, `KeyNotInTable`, `ChunkNotFound`, `MetaNotFound` |
//! | Conflict | `Conflict`, `TableExists` |
//! | Validation | `Validation` |
//! | MalformedQuery | `MalformedQuery` |
//! | IllegalName | `IllegalName` |
//! | Storage | `Io`, `Serialization`, `Corruption`, `Config` |

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for crumb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the crumb database
#[derive(Debug, Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// Table missing from the tenant's table index
    #[error("No table with name {table:?}")]
    TableNotFound {
        /// Requested table
        table: String,
    },

    /// Key missing from the tenant's key index
    #[error("No such key {key:?}")]
    KeyNotFound {
        /// Requested key
        key: String,
    },

    /// Key exists but belongs to another table
    #[error("No such key {key:?} in table {table:?}")]
    KeyNotInTable {
        /// Requested key
        key: String,
        /// Requested table
        table: String,
    },

    /// Chunk file absent
    #[error("Chunk {chunk:?} does not exist")]
    ChunkNotFound {
        /// Chunk identifier
        chunk: String,
    },

    /// Tenant metadata file absent
    #[error("Meta does not exist for tenant {tenant:?}")]
    MetaNotFound {
        /// Tenant name
        tenant: String,
    },

    // ==================== Conflict ====================
    /// Uniqueness violation
    #[error("Field {path:?} is not unique despite schema specifying it to be unique, {value}")]
    Conflict {
        /// Qualified field path (`table.field.subfield`)
        path: String,
        /// Offending value (index token form)
        value: String,
    },

    /// Rename target already names a table
    #[error("Table {table:?} already exists")]
    TableExists {
        /// Existing table
        table: String,
    },

    // ==================== Validation ====================
    /// Document or schema failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ==================== Query ====================
    /// Condition expression could not be parsed or evaluated
    #[error(transparent)]
    MalformedQuery(#[from] QueryError),

    // ==================== Naming ====================
    /// Table name contains `.`, or tenant name would escape its directory
    #[error("Illegal name {name:?}")]
    IllegalName {
        /// Rejected name
        name: String,
    },

    // ==================== Storage ====================
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Underlying encoder/decoder message
        reason: String,
    },

    /// On-disk record failed an integrity check
    #[error("Data corruption: {reason}")]
    Corruption {
        /// What was detected
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What was rejected
        reason: String,
    },
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing table, key, chunk or meta
    NotFound,
    /// Uniqueness violation
    Conflict,
    /// Schema or document validation failure
    Validation,
    /// DSL parse or evaluation failure
    MalformedQuery,
    /// Reserved character in a table name
    IllegalName,
    /// I/O, encoding, corruption or configuration failure
    Storage,
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TableNotFound { .. }
            | Error::KeyNotFound { .. }
            | Error::KeyNotInTable { .. }
            | Error::ChunkNotFound { .. }
            | Error::MetaNotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } | Error::TableExists { .. } => ErrorKind::Conflict,
            Error::Validation(_) => ErrorKind::Validation,
            Error::MalformedQuery(_) => ErrorKind::MalformedQuery,
            Error::IllegalName { .. } => ErrorKind::IllegalName,
            Error::Io(_)
            | Error::Serialization { .. }
            | Error::Corruption { .. }
            | Error::Config { .. } => ErrorKind::Storage,
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Build a serialization error from any displayable cause
    pub fn serialization(reason: impl fmt::Display) -> Self {
        Error::Serialization {
            reason: reason.to_string(),
        }
    }

    /// Build a corruption error from any displayable cause
    pub fn corruption(reason: impl fmt::Display) -> Self {
        Error::Corruption {
            reason: reason.to_string(),
        }
    }
}

/// Document or schema validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // ==================== Document shape ====================
    /// Document keys differ from schema keys
    #[error("Schema and document have different keys. Expected {expected:?}, got {actual:?}")]
    KeyMismatch {
        /// Schema keys (sorted)
        expected: Vec<String>,
        /// Document keys (sorted)
        actual: Vec<String>,
    },

    /// Document uses the reserved field name
    #[error("Invalid document provided. Documents cannot have a key value of \"key\"")]
    ReservedKey,

    /// Schema expects a nested document, got a scalar
    #[error("Expected {expected} for key {field:?}, got {actual}")]
    ExpectedObject {
        /// Field name
        field: String,
        /// Expected sub-schema, rendered
        expected: String,
        /// Actual value, rendered
        actual: String,
    },

    /// Schema expects a scalar, got a nested document
    #[error("Expected {spec:?} for key {field:?}, got an object")]
    ExpectedScalar {
        /// Field name
        field: String,
        /// Leaf spec string
        spec: String,
    },

    /// Scalar has the wrong runtime type
    #[error("Expected {expected} for key {field:?}, got {actual}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type
        expected: String,
        /// Actual value, rendered
        actual: String,
    },

    /// Foreign key does not name an existing document
    #[error("Expected a foreign key for key {field:?}, got {value}")]
    UnresolvedForeignKey {
        /// Field name
        field: String,
        /// Offending value, rendered
        value: String,
    },

    // ==================== Schema definition ====================
    /// Schema field name contains `.` or `,`
    #[error("Key {field:?} is invalid. Keys cannot have a \".\" or \",\" in them")]
    IllegalFieldName {
        /// Field name
        field: String,
    },

    /// Schema field named `key`
    #[error("Key \"key\" is invalid. Keys cannot be named \"key\"")]
    ReservedFieldName,

    /// Spec string without a type token
    #[error("Schema value does not include any types in {spec:?}")]
    MissingType {
        /// Spec string
        spec: String,
    },

    /// Spec string repeats a token
    #[error("Duplicate schema value found in {spec:?}")]
    DuplicateModifier {
        /// Spec string
        spec: String,
    },

    /// Spec string with an unknown token
    #[error("Unexpected schema value {token:?} in {spec:?}")]
    UnknownModifier {
        /// Unknown token
        token: String,
        /// Spec string
        spec: String,
    },
}

/// Expected argument count of a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exactly(usize),
    /// n or more arguments
    AtLeast(usize),
}

impl Arity {
    /// Check an argument count
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exactly(1) => write!(f, "1 child"),
            Arity::Exactly(n) => write!(f, "{} children", n),
            Arity::AtLeast(1) => write!(f, "at least 1 child"),
            Arity::AtLeast(n) => write!(f, "at least {} children", n),
        }
    }
}

/// Condition DSL parse or evaluation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Text is not a literal, reference or call
    #[error("failed to parse condition ({input})")]
    Parse {
        /// Offending text
        input: String,
    },

    /// Unbalanced parentheses or an unterminated string literal
    #[error("unbalanced condition ({input})")]
    Unbalanced {
        /// Offending text
        input: String,
    },

    /// Function name not in the builtin table
    #[error("Unknown condition: {name}")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// Wrong number of arguments
    #[error("Expected {expected} for {function}")]
    Arity {
        /// Function name
        function: String,
        /// Accepted argument count
        expected: Arity,
    },

    /// Argument of the wrong type
    #[error("Expected children of {function} to be a {expected}")]
    OperandType {
        /// Function name
        function: String,
        /// Expected operand type
        expected: &'static str,
    },

    /// `$a.b` reference that does not resolve
    #[error("Invalid property key {reference}")]
    InvalidProperty {
        /// Reference text including the `$`
        reference: String,
    },

    /// `$N` reference past the end of the sub-query results
    #[error("Positional reference ${index} out of range for {len} results")]
    PositionalOutOfRange {
        /// Referenced position
        index: usize,
        /// Number of available results
        len: usize,
    },

    /// Timestamp outside the representable date range
    #[error("Invalid timestamp {value} for {function}")]
    InvalidTimestamp {
        /// Function name
        function: String,
        /// Millisecond timestamp
        value: f64,
    },

    /// Order expression evaluated to null
    #[error("Can't order by null value")]
    NullOrderKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::TableNotFound { table: "t".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::KeyNotInTable {
                key: "k".into(),
                table: "t".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::Conflict {
                path: "t.a".into(),
                value: "x".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::from(ValidationError::ReservedKey).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::from(QueryError::NullOrderKey).kind(),
            ErrorKind::MalformedQuery
        );
        assert_eq!(
            Error::IllegalName { name: "a.b".into() }.kind(),
            ErrorKind::IllegalName
        );
        assert_eq!(
            Error::from(io::Error::new(io::ErrorKind::Other, "boom")).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_arity_messages() {
        let err = QueryError::Arity {
            function: "gt".into(),
            expected: Arity::Exactly(2),
        };
        assert_eq!(err.to_string(), "Expected 2 children for gt");

        let err = QueryError::Arity {
            function: "not".into(),
            expected: Arity::Exactly(1),
        };
        assert_eq!(err.to_string(), "Expected 1 child for not");
    }

    #[test]
    fn test_operand_message() {
        let err = QueryError::OperandType {
            function: "gt".into(),
            expected: "number",
        };
        assert_eq!(err.to_string(), "Expected children of gt to be a number");
    }

    #[test]
    fn test_conflict_message_names_value() {
        let err = Error::Conflict {
            path: "users.email".into(),
            value: "a@b.c".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("users.email"));
        assert!(msg.contains("a@b.c"));
    }

    #[test]
    fn test_key_mismatch_lists_both_sets() {
        let err = ValidationError::KeyMismatch {
            expected: vec!["a".into(), "b".into()],
            actual: vec!["a".into(), "c".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"b\""));
        assert!(msg.contains("\"c\""));
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(4));
        assert!(!Arity::AtLeast(1).accepts(0));
    }
}
