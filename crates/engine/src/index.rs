//! Uniqueness index maintenance
//!
//! Walks a (document, schema) pair in lockstep and visits every leaf whose
//! spec includes `unique`. Each such leaf owns one entry of
//! `Meta::row_index`, keyed by its qualified path (`table.field.sub`) and
//! mapping index tokens (see [`Value::index_token`]) to document keys.
//!
//! [`verify`] must run before [`index`] so a rejected write never touches
//! the index.

use crumb_core::{
    Document, Error, FieldSpec, Meta, Node, Result, Schema, SchemaNode, Value,
};
use tracing::trace;

/// A unique leaf found by the walk
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueField<'a> {
    /// Qualified path including the table name
    pub path: String,
    /// Leaf value
    pub value: &'a Value,
}

/// Collect every unique leaf of `document`, qualified by `table`.
///
/// Leaves whose document value is missing or has the wrong shape are
/// skipped; validation reports those.
pub fn unique_fields<'a>(document: &'a Document, schema: &Schema, table: &str) -> Vec<UniqueField<'a>> {
    let mut out = Vec::new();
    walk(document, schema, table, &mut out);
    out
}

fn walk<'a>(document: &'a Document, schema: &Schema, prefix: &str, out: &mut Vec<UniqueField<'a>>) {
    for (field, spec) in schema {
        let path = format!("{}.{}", prefix, field);
        match (spec, document.get(field)) {
            (SchemaNode::Object(sub), Some(Node::Object(sub_doc))) => {
                walk(sub_doc, sub, &path, out);
            }
            (SchemaNode::Leaf(raw), Some(Node::Leaf(value))) => {
                if FieldSpec::parse(raw).map(|s| s.unique).unwrap_or(false) {
                    out.push(UniqueField { path, value });
                }
            }
            _ => {}
        }
    }
}

/// Map every unique value of `document` to `key`, overwriting prior owners.
pub fn index(meta: &mut Meta, document: &Document, schema: &Schema, table: &str, key: &str) {
    for field in unique_fields(document, schema, table) {
        let token = field.value.index_token();
        trace!(target: "crumb::index", path = %field.path, %token, key, "Index");
        meta.row_index
            .entry(field.path)
            .or_default()
            .insert(token, key.to_string());
    }
}

/// Remove every unique value of `document` from the index.
///
/// Absent entries are ignored. A path left with no values is removed.
pub fn unindex(meta: &mut Meta, document: &Document, schema: &Schema, table: &str) {
    for field in unique_fields(document, schema, table) {
        let token = field.value.index_token();
        if let Some(values) = meta.row_index.get_mut(&field.path) {
            values.remove(&token);
            if values.is_empty() {
                meta.row_index.remove(&field.path);
            }
        }
    }
}

/// Fail with `Conflict` if any unique value of `document` is owned by a
/// document other than `key`. `None` means a new document.
pub fn verify(
    meta: &Meta,
    document: &Document,
    schema: &Schema,
    table: &str,
    key: Option<&str>,
) -> Result<()> {
    for field in unique_fields(document, schema, table) {
        let token = field.value.index_token();
        let owner = meta
            .row_index
            .get(&field.path)
            .and_then(|values| values.get(&token));

        if let Some(owner) = owner {
            if key != Some(owner.as_str()) {
                return Err(Error::Conflict {
                    path: field.path,
                    value: token,
                });
            }
        }
    }
    Ok(())
}
