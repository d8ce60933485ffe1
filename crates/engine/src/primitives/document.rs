//! DocumentStore: document operations
//!
//! - `insert` / `bulk_insert` - validate, index and place new documents
//! - `get` - fetch by key, optionally expanding foreign keys
//! - `update` - full replace of an existing document
//! - `delete` / `delete_where` - remove by key or by filter
//! - `select` - run the select pipeline
//!
//! On tables with a schema, every written document is validated and its
//! unique fields are verified against the index before anything changes.

use crate::database::Database;
use crate::expand::expand;
use crate::index;
use crate::select::{self, Filter, SelectOptions, Where};
use crate::session::Session;
use crate::validate::{check_reserved_key, validate_document};
use crumb_core::{DocKey, Document, Error, Node, Result, Schema, RESERVED_KEY_FIELD};
use std::sync::Arc;
use tracing::{debug, warn};

/// Document operations facade
///
/// # Example
///
/// ```text
/// let db = Database::open("/path/to/data")?;
/// let docs = DocumentStore::new(db);
///
/// let key = docs.insert("alice", "dogs", document)?;
/// let stored = docs.get("alice", "dogs", &key, false)?;
/// docs.delete("alice", "dogs", &key)?;
/// ```
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
}

impl DocumentStore {
    /// Create new DocumentStore instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert one document, returning its generated key
    pub fn insert(&self, tenant: &str, table: &str, document: Document) -> Result<DocKey> {
        self.db.transaction(tenant, |session| {
            let schema = session.meta().table(table)?.schema.clone();
            insert_one(session, table, schema.as_ref(), document)
        })
    }

    /// Insert many documents, returning their keys in input order.
    ///
    /// All or nothing: one rejected document rejects the batch.
    pub fn bulk_insert(&self, tenant: &str, table: &str, documents: Vec<Document>) -> Result<Vec<DocKey>> {
        self.db.transaction(tenant, |session| {
            let schema = session.meta().table(table)?.schema.clone();
            let mut keys = Vec::with_capacity(documents.len());
            for document in documents {
                keys.push(insert_one(session, table, schema.as_ref(), document)?);
            }
            debug!(target: "crumb::ops", tenant, table, count = keys.len(), "Bulk insert");
            Ok(keys)
        })
    }

    /// Fetch a document with its `key` field injected
    pub fn get(&self, tenant: &str, table: &str, key: &str, expand_keys: bool) -> Result<Document> {
        self.db.read(tenant, |session| {
            let mut document = stored(session, table, key)?;
            if expand_keys {
                document = expand(session, &document, Some(key))?;
            }
            document.insert(RESERVED_KEY_FIELD.to_string(), Node::from(key));
            Ok(document)
        })
    }

    /// Replace the document stored under `key`
    pub fn update(&self, tenant: &str, table: &str, key: &str, document: Document) -> Result<()> {
        self.db.transaction(tenant, |session| {
            let previous = stored(session, table, key)?;
            let schema = session.meta().table(table)?.schema.clone();

            match &schema {
                Some(schema) => {
                    validate_document(&document, schema, session.meta())?;
                    index::verify(session.meta(), &document, schema, table, Some(key))?;
                    index::unindex(session.meta_mut(), &previous, schema, table);
                    index::index(session.meta_mut(), &document, schema, table, key);
                }
                None => check_reserved_key(&document)?,
            }

            session.overwrite(key, document)?;
            debug!(target: "crumb::ops", tenant, table, key, "Updated document");
            Ok(())
        })
    }

    /// Delete the document stored under `key`
    pub fn delete(&self, tenant: &str, table: &str, key: &str) -> Result<()> {
        self.db.transaction(tenant, |session| {
            let schema = session.meta().table(table)?.schema.clone();
            delete_one(session, table, schema.as_ref(), key)
        })
    }

    /// Delete every document matching `filter`, returning how many went.
    ///
    /// No result cap applies. Each touched chunk is written once.
    pub fn delete_where(&self, tenant: &str, table: &str, filter: &Where) -> Result<usize> {
        let filter = Filter::compile(filter)?;
        self.db.transaction(tenant, |session| {
            let schema = session.meta().table(table)?.schema.clone();
            let keys = select::matching_keys(session, table, &filter)?;
            for key in &keys {
                delete_one(session, table, schema.as_ref(), key)?;
            }
            debug!(target: "crumb::ops", tenant, table, count = keys.len(), "Deleted by filter");
            Ok(keys.len())
        })
    }

    /// Run a select
    pub fn select(&self, tenant: &str, table: &str, options: &SelectOptions) -> Result<Vec<Document>> {
        let default_max_results = self.db.config().default_max_results;
        self.db.read(tenant, |session| {
            select::select(session, table, options, default_max_results)
        })
    }
}

/// Copy of the document under `key`, which must belong to `table`
fn stored(session: &mut Session<'_>, table: &str, key: &str) -> Result<Document> {
    session.meta().table(table)?;
    let chunk = session.meta().locate(table, key)?.clone();
    let document = session.chunk(&chunk)?.get(key).cloned();
    match document {
        Some(document) => Ok(document),
        None => {
            warn!(target: "crumb::ops", tenant = session.tenant(), key, chunk = %chunk,
                "key_index points at a chunk without the document");
            Err(Error::KeyNotFound {
                key: key.to_string(),
            })
        }
    }
}

fn insert_one(
    session: &mut Session<'_>,
    table: &str,
    schema: Option<&Schema>,
    document: Document,
) -> Result<DocKey> {
    match schema {
        Some(schema) => {
            validate_document(&document, schema, session.meta())?;
            index::verify(session.meta(), &document, schema, table, None)?;
        }
        None => check_reserved_key(&document)?,
    }

    let key = session.generate_key();
    if let Some(schema) = schema {
        index::index(session.meta_mut(), &document, schema, table, &key);
    }
    let chunk = session.place(table, &key, document)?;
    debug!(target: "crumb::ops", tenant = session.tenant(), table, key = %key, chunk = %chunk, "Inserted document");
    Ok(key)
}

fn delete_one(session: &mut Session<'_>, table: &str, schema: Option<&Schema>, key: &str) -> Result<()> {
    let removed = session.take(table, key)?;
    if let (Some(schema), Some(document)) = (schema, &removed) {
        index::unindex(session.meta_mut(), document, schema, table);
    }
    debug!(target: "crumb::ops", tenant = session.tenant(), table, key, "Deleted document");
    Ok(())
}
