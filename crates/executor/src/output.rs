//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is
//! deterministic: the same command always produces the same output variant
//! (though the values may differ based on database state).

use crumb_core::Document;
use crumb_engine::MetaInfo;
use serde::{Deserialize, Serialize};

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output`
/// variant, documented on the command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (drop, edit, update, delete)
    Unit,

    /// Boolean result (create)
    Bool(bool),

    /// Generated key (insert)
    Key(String),

    /// Generated keys in input order (bulk insert)
    Keys(Vec<String>),

    /// One document (get)
    Document(Document),

    /// Select results in result order
    Documents(Vec<Document>),

    /// Number of affected documents (delete where)
    Count(usize),

    /// Table descriptions (meta)
    Meta(MetaInfo),
}
