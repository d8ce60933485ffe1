//! TableStore: table lifecycle
//!
//! - `create(tenant, table, schema)` - idempotent create
//! - `drop(tenant, table)` - remove a table and all its documents
//! - `edit(tenant, table, edit)` - rename, reschema and/or reshape documents
//! - `meta(tenant, table)` - describe one table or all of them
//!
//! Table names may not contain `.`, which separates path segments in the
//! uniqueness index.

use crate::database::Database;
use crate::expand::{Alias, Projection};
use crate::index;
use crate::session::Session;
use crate::validate::{check_reserved_key, validate_document, validate_schema};
use crumb_core::{Chunk, Error, Result, Schema, TableMeta};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Changes applied by [`TableStore::edit`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEdit {
    /// New table name
    #[serde(default)]
    pub name: Option<String>,
    /// New schema: absent keeps it, `null` removes it
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<Option<Schema>>,
    /// Rewrite every document through this alias
    #[serde(default)]
    pub alias: Option<Alias>,
}

fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Description of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table schema
    pub schema: Option<Schema>,
    /// Number of chunks
    pub chunks: usize,
    /// Number of documents
    pub documents: usize,
    /// Bytes used by the table's chunks in the store
    pub size_bytes: u64,
}

/// Result of [`TableStore::meta`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaInfo {
    /// One table
    Table(TableInfo),
    /// Every table by name
    Tables(BTreeMap<String, TableInfo>),
}

fn check_table_name(name: &str) -> Result<()> {
    if name.contains('.') {
        return Err(Error::IllegalName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Table lifecycle facade
#[derive(Clone)]
pub struct TableStore {
    db: Arc<Database>,
}

impl TableStore {
    /// Create new TableStore instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a table.
    ///
    /// Returns `false`, changing nothing, when the table already exists.
    pub fn create(&self, tenant: &str, table: &str, schema: Option<Schema>) -> Result<bool> {
        check_table_name(table)?;
        if let Some(schema) = &schema {
            validate_schema(schema)?;
        }

        self.db.transaction(tenant, |session| {
            if session.meta().table_index.contains_key(table) {
                return Ok(false);
            }
            session
                .meta_mut()
                .table_index
                .insert(table.to_string(), TableMeta::new(schema));
            info!(target: "crumb::ops", tenant, table, "Created table");
            Ok(true)
        })
    }

    /// Drop a table with every document and uniqueness entry it owns
    pub fn drop(&self, tenant: &str, table: &str) -> Result<()> {
        self.db.transaction(tenant, |session| {
            session.meta().table(table)?;
            let chunks = session.discard_chunks(table)?;
            let meta = session.meta_mut();
            meta.drop_row_index(table);
            meta.table_index.remove(table);
            info!(target: "crumb::ops", tenant, table, chunks, "Dropped table");
            Ok(())
        })
    }

    /// Apply a [`TableEdit`].
    ///
    /// Every document is transformed and checked against the resulting
    /// schema before anything is written; one failing document aborts the
    /// whole edit.
    pub fn edit(&self, tenant: &str, table: &str, edit: TableEdit) -> Result<()> {
        if let Some(name) = &edit.name {
            check_table_name(name)?;
        }
        if let Some(Some(schema)) = &edit.schema {
            validate_schema(schema)?;
        }
        let projection = edit.alias.as_ref().map(Projection::compile).transpose()?;

        self.db.transaction(tenant, |session| {
            let current = session.meta().table(table)?.schema.clone();
            if let Some(name) = &edit.name {
                if name != table && session.meta().table_index.contains_key(name) {
                    return Err(Error::TableExists {
                        table: name.clone(),
                    });
                }
            }

            let schema = match &edit.schema {
                Some(replacement) => replacement.clone(),
                None => current,
            };

            if edit.schema.is_some() || projection.is_some() {
                rewrite_documents(session, table, schema.as_ref(), projection.as_ref())?;
            }
            session.meta_mut().table_mut(table)?.schema = schema;

            if let Some(name) = edit.name.as_deref().filter(|n| *n != table) {
                let meta = session.meta_mut();
                if let Some(entry) = meta.table_index.remove(table) {
                    meta.table_index.insert(name.to_string(), entry);
                }
                meta.rename_row_index(table, name);
            }

            info!(
                target: "crumb::ops",
                tenant,
                table,
                renamed = edit.name.as_deref().unwrap_or(table),
                reschema = edit.schema.is_some(),
                alias = projection.is_some(),
                "Edited table"
            );
            Ok(())
        })
    }

    /// Describe one table, or all tables when `table` is `None`
    pub fn meta(&self, tenant: &str, table: Option<&str>) -> Result<MetaInfo> {
        self.db.read(tenant, |session| match table {
            Some(table) => Ok(MetaInfo::Table(describe(session, table)?)),
            None => {
                let names: Vec<String> = session.meta().table_index.keys().cloned().collect();
                let mut tables = BTreeMap::new();
                for name in names {
                    let info = describe(session, &name)?;
                    tables.insert(name, info);
                }
                Ok(MetaInfo::Tables(tables))
            }
        })
    }
}

/// Transform every document of `table`, then rebuild its uniqueness index
/// against `schema`.
fn rewrite_documents(
    session: &mut Session<'_>,
    table: &str,
    schema: Option<&Schema>,
    projection: Option<&Projection>,
) -> Result<()> {
    let chunk_ids = session.meta().table(table)?.chunks.clone();

    let mut rewritten: Vec<(String, Chunk)> = Vec::with_capacity(chunk_ids.len());
    for id in &chunk_ids {
        let chunk = session.chunk(id)?;
        let contents = match projection {
            Some(projection) => chunk
                .iter()
                .map(|(key, doc)| Ok((key.clone(), projection.project(doc)?)))
                .collect::<Result<Chunk>>()?,
            None => chunk.clone(),
        };
        rewritten.push((id.clone(), contents));
    }

    session.meta_mut().drop_row_index(table);
    for (_, chunk) in &rewritten {
        for (key, document) in chunk {
            match schema {
                Some(schema) => {
                    validate_document(document, schema, session.meta())?;
                    index::verify(session.meta(), document, schema, table, Some(key))?;
                    index::index(session.meta_mut(), document, schema, table, key);
                }
                None => check_reserved_key(document)?,
            }
        }
    }

    if projection.is_some() {
        for (id, chunk) in rewritten {
            session.replace_chunk(&id, chunk);
        }
    }
    Ok(())
}

fn describe(session: &Session<'_>, table: &str) -> Result<TableInfo> {
    let meta = session.meta().table(table)?;
    let schema = meta.schema.clone();
    let chunks = meta.chunks.clone();

    let documents = chunks.iter().map(|c| session.chunk_fill(c)).sum();
    let mut size_bytes = 0;
    for chunk in &chunks {
        size_bytes += session.store().chunk_size(session.tenant(), chunk)?;
    }

    Ok(TableInfo {
        schema,
        chunks: chunks.len(),
        documents,
        size_bytes,
    })
}
