//! Command enum defining all crumb operations.
//!
//! Commands are the "instruction set" of crumb. Every operation a request
//! layer can perform on a tenant is a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Tagged by `op`, so a request body decodes directly
//! - **Pure data**: No closures or executable code

use crumb_core::{Document, Schema};
use crumb_engine::{SelectOptions, TableEdit, Where};
use serde::{Deserialize, Serialize};

/// A command is a self-contained, serializable operation.
///
/// The tenant is not part of the command; it is resolved by the caller
/// and passed to [`Executor::execute`](crate::Executor::execute).
///
/// # Example
///
/// ```text
/// {"op": "insert", "table": "dogs", "document": {"name": "Yogi", "age": 12}}
/// {"op": "select", "table": "dogs", "where": "gt($age, 10)", "max_results": 5}
/// {"op": "edit", "table": "dogs", "name": "pets", "schema": null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    // ==================== Tables ====================
    /// Create a table. Returns: `Output::Bool` (false if it existed)
    Create {
        table: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Schema>,
    },

    /// Drop a table and its documents. Returns: `Output::Unit`
    Drop { table: String },

    /// Rename, reschema or reshape a table. Returns: `Output::Unit`
    Edit {
        table: String,
        #[serde(flatten)]
        edit: TableEdit,
    },

    /// Describe one table or all. Returns: `Output::Meta`
    Meta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<String>,
    },

    // ==================== Documents ====================
    /// Insert one document. Returns: `Output::Key`
    Insert { table: String, document: Document },

    /// Insert many documents. Returns: `Output::Keys`
    BulkInsert {
        table: String,
        documents: Vec<Document>,
    },

    /// Fetch a document. Returns: `Output::Document`
    Get {
        table: String,
        key: String,
        #[serde(default)]
        expand_keys: bool,
    },

    /// Replace a document. Returns: `Output::Unit`
    Update {
        table: String,
        key: String,
        document: Document,
    },

    /// Delete a document by key. Returns: `Output::Unit`
    Delete { table: String, key: String },

    /// Delete every document matching a filter. Returns: `Output::Count`
    DeleteWhere {
        table: String,
        #[serde(rename = "where", default)]
        filter: Where,
    },

    /// Run a select. Returns: `Output::Documents`
    Select {
        table: String,
        #[serde(flatten)]
        options: SelectOptions,
    },
}

impl Command {
    /// Operation name, as it appears in the `op` tag
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Drop { .. } => "drop",
            Command::Edit { .. } => "edit",
            Command::Meta { .. } => "meta",
            Command::Insert { .. } => "insert",
            Command::BulkInsert { .. } => "bulk_insert",
            Command::Get { .. } => "get",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::DeleteWhere { .. } => "delete_where",
            Command::Select { .. } => "select",
        }
    }

    /// Whether the command may change stored data
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Command::Meta { .. } | Command::Get { .. } | Command::Select { .. }
        )
    }
}
