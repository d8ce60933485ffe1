//! Tenant metadata and chunk records
//!
//! Each tenant persists one [`Meta`] record and any number of [`Chunk`]
//! records. Meta holds three indexes:
//!
//! - `key_index`: document key -> chunk id, across all tables
//! - `table_index`: table name -> [`TableMeta`] (schema + ordered chunk ids)
//! - `row_index`: qualified field path -> index token -> document key,
//!   populated only for schema fields marked `unique`
//!
//! A chunk belongs to the table whose `chunks` list contains its id.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generated document key (uuid v4 text)
pub type DocKey = String;

/// Generated chunk identifier (uuid v4 text)
pub type ChunkId = String;

/// A bounded batch of documents, keyed by document key
pub type Chunk = BTreeMap<DocKey, Document>;

/// Value token -> document key, for one unique field path
pub type ValueIndex = BTreeMap<String, DocKey>;

/// Per-table metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Schema, if the table was created with one
    pub schema: Option<Schema>,
    /// Chunk ids in allocation order
    pub chunks: Vec<ChunkId>,
}

impl TableMeta {
    /// Create table metadata with no chunks
    pub fn new(schema: Option<Schema>) -> Self {
        TableMeta {
            schema,
            chunks: Vec::new(),
        }
    }
}

/// Per-tenant index record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Document key -> chunk id
    pub key_index: BTreeMap<DocKey, ChunkId>,
    /// Table name -> table metadata
    pub table_index: BTreeMap<String, TableMeta>,
    /// Qualified field path -> value token -> document key
    pub row_index: BTreeMap<String, ValueIndex>,
}

impl Meta {
    /// Create empty metadata for a fresh tenant
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table, failing with `TableNotFound`
    pub fn table(&self, table: &str) -> Result<&TableMeta> {
        self.table_index
            .get(table)
            .ok_or_else(|| Error::TableNotFound {
                table: table.to_string(),
            })
    }

    /// Look up a table mutably, failing with `TableNotFound`
    pub fn table_mut(&mut self, table: &str) -> Result<&mut TableMeta> {
        self.table_index
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound {
                table: table.to_string(),
            })
    }

    /// Name of the table that lists `chunk`
    pub fn table_of_chunk(&self, chunk: &str) -> Option<&str> {
        self.table_index
            .iter()
            .find(|(_, meta)| meta.chunks.iter().any(|c| c == chunk))
            .map(|(name, _)| name.as_str())
    }

    /// Resolve a key to its chunk, checking it belongs to `table`.
    ///
    /// Fails with `KeyNotFound` when the key is unknown and with
    /// `KeyNotInTable` when its chunk is listed by another table.
    pub fn locate(&self, table: &str, key: &str) -> Result<&ChunkId> {
        let chunk = self.key_index.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })?;

        let owns = self
            .table_index
            .get(table)
            .map(|t| t.chunks.iter().any(|c| c == chunk))
            .unwrap_or(false);

        if !owns {
            return Err(Error::KeyNotInTable {
                key: key.to_string(),
                table: table.to_string(),
            });
        }

        Ok(chunk)
    }

    /// Check whether a document key exists anywhere in the tenant
    pub fn contains_key(&self, key: &str) -> bool {
        self.key_index.contains_key(key)
    }

    /// Remove every `row_index` entry under the `table.` path prefix
    pub fn drop_row_index(&mut self, table: &str) {
        let prefix = format!("{}.", table);
        self.row_index.retain(|path, _| !path.starts_with(&prefix));
    }

    /// Move every `row_index` entry under `from.` to `to.`
    pub fn rename_row_index(&mut self, from: &str, to: &str) {
        let prefix = format!("{}.", from);
        let moved: Vec<String> = self
            .row_index
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();

        for path in moved {
            if let Some(index) = self.row_index.remove(&path) {
                let renamed = format!("{}.{}", to, &path[prefix.len()..]);
                self.row_index.insert(renamed, index);
            }
        }
    }
}
