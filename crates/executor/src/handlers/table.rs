//! Table command handlers.

use std::sync::Arc;

use crumb_core::Schema;
use crumb_engine::TableEdit;

use crate::bridge::Primitives;
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Create command.
pub fn create(p: &Arc<Primitives>, tenant: &str, table: String, schema: Option<Schema>) -> Result<Output> {
    let created = convert_result(p.tables.create(tenant, &table, schema))?;
    Ok(Output::Bool(created))
}

/// Handle Drop command.
pub fn drop(p: &Arc<Primitives>, tenant: &str, table: String) -> Result<Output> {
    convert_result(p.tables.drop(tenant, &table))?;
    Ok(Output::Unit)
}

/// Handle Edit command.
pub fn edit(p: &Arc<Primitives>, tenant: &str, table: String, edit: TableEdit) -> Result<Output> {
    convert_result(p.tables.edit(tenant, &table, edit))?;
    Ok(Output::Unit)
}

/// Handle Meta command.
pub fn meta(p: &Arc<Primitives>, tenant: &str, table: Option<String>) -> Result<Output> {
    let info = convert_result(p.tables.meta(tenant, table.as_deref()))?;
    Ok(Output::Meta(info))
}
