//! Document command handlers.

use std::sync::Arc;

use crumb_core::Document;
use crumb_engine::{SelectOptions, Where};

use crate::bridge::Primitives;
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Insert command.
pub fn insert(p: &Arc<Primitives>, tenant: &str, table: String, document: Document) -> Result<Output> {
    let key = convert_result(p.documents.insert(tenant, &table, document))?;
    Ok(Output::Key(key))
}

/// Handle BulkInsert command.
pub fn bulk_insert(
    p: &Arc<Primitives>,
    tenant: &str,
    table: String,
    documents: Vec<Document>,
) -> Result<Output> {
    let keys = convert_result(p.documents.bulk_insert(tenant, &table, documents))?;
    Ok(Output::Keys(keys))
}

/// Handle Get command.
pub fn get(
    p: &Arc<Primitives>,
    tenant: &str,
    table: String,
    key: String,
    expand_keys: bool,
) -> Result<Output> {
    let document = convert_result(p.documents.get(tenant, &table, &key, expand_keys))?;
    Ok(Output::Document(document))
}

/// Handle Update command.
pub fn update(
    p: &Arc<Primitives>,
    tenant: &str,
    table: String,
    key: String,
    document: Document,
) -> Result<Output> {
    convert_result(p.documents.update(tenant, &table, &key, document))?;
    Ok(Output::Unit)
}

/// Handle Delete command.
pub fn delete(p: &Arc<Primitives>, tenant: &str, table: String, key: String) -> Result<Output> {
    convert_result(p.documents.delete(tenant, &table, &key))?;
    Ok(Output::Unit)
}

/// Handle DeleteWhere command.
pub fn delete_where(p: &Arc<Primitives>, tenant: &str, table: String, filter: Where) -> Result<Output> {
    let count = convert_result(p.documents.delete_where(tenant, &table, &filter))?;
    Ok(Output::Count(count))
}

/// Handle Select command.
pub fn select(
    p: &Arc<Primitives>,
    tenant: &str,
    table: String,
    options: SelectOptions,
) -> Result<Output> {
    let documents = convert_result(p.documents.select(tenant, &table, &options))?;
    Ok(Output::Documents(documents))
}
