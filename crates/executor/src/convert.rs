//! Error conversion from internal error types.
//!
//! Maps [`crumb_core::Error`] onto the executor's serializable [`Error`],
//! keeping structured fields where they exist and rendering nested
//! validation and query errors to text.

use crate::Error;
use crumb_core::Error as CoreError;

impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        match err {
            // Not Found errors
            CoreError::TableNotFound { table } => Error::TableNotFound { table },
            CoreError::KeyNotFound { key } => Error::KeyNotFound { key },
            CoreError::KeyNotInTable { key, table } => Error::KeyNotInTable { key, table },
            CoreError::MetaNotFound { tenant } => Error::TenantNotFound { tenant },
            CoreError::ChunkNotFound { chunk } => Error::Internal {
                reason: format!("chunk {} is listed but missing", chunk),
            },

            // Conflict errors
            CoreError::Conflict { path, value } => Error::Conflict { path, value },
            CoreError::TableExists { table } => Error::TableExists { table },

            // Input errors
            CoreError::Validation(e) => Error::Validation {
                reason: e.to_string(),
            },
            CoreError::MalformedQuery(e) => Error::MalformedQuery {
                reason: e.to_string(),
            },
            CoreError::IllegalName { name } => Error::IllegalName { name },

            // System errors
            CoreError::Io(e) => Error::Io {
                reason: e.to_string(),
            },
            CoreError::Serialization { reason } => Error::Serialization { reason },
            CoreError::Corruption { reason } => Error::Corruption { reason },
            CoreError::Config { reason } => Error::Config { reason },
        }
    }
}

/// Convert an engine result to an executor result
pub(crate) fn convert_result<T>(result: crumb_core::Result<T>) -> crate::Result<T> {
    result.map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumb_core::{QueryError, ValidationError};

    #[test]
    fn test_categories_follow_core_kinds() {
        let cases = [
            (
                CoreError::TableNotFound { table: "t".into() },
                "not_found",
            ),
            (
                CoreError::MetaNotFound { tenant: "x".into() },
                "not_found",
            ),
            (
                CoreError::Conflict {
                    path: "t.a".into(),
                    value: "1".into(),
                },
                "conflict",
            ),
            (CoreError::Validation(ValidationError::ReservedKey), "validation"),
            (
                CoreError::MalformedQuery(QueryError::NullOrderKey),
                "malformed_query",
            ),
            (CoreError::IllegalName { name: "a.b".into() }, "illegal_name"),
            (
                CoreError::ChunkNotFound { chunk: "c".into() },
                "internal",
            ),
        ];
        for (core, category) in cases {
            assert_eq!(Error::from(core).category(), category);
        }
    }

    #[test]
    fn test_nested_messages_are_kept() {
        let err = Error::from(CoreError::MalformedQuery(QueryError::UnknownFunction {
            name: "nope".into(),
        }));
        match err {
            Error::MalformedQuery { reason } => assert!(reason.contains("nope")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
