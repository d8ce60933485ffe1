//! Select pipeline
//!
//! Documents are visited in chunk-list order, then key order within a
//! chunk. Each match goes through, in order:
//!
//! 1. foreign-key expansion (`expand_keys`)
//! 2. alias projection (`alias`), then expansion again when both are set
//! 3. key injection (`show_keys`)
//!
//! Without `order`, the cap is checked before each document is evaluated
//! and collection stops once `max_results` documents match; zero returns
//! nothing and a negative cap never triggers. With `order`, every match is
//! collected and sorted before truncation, and a `max_results` of zero or
//! less disables truncation.

use crate::expand::{expand, Alias, Projection};
use crate::session::Session;
use crumb_core::{DocKey, Document, Node, QueryError, Result, Value, RESERVED_KEY_FIELD};
use crumb_query::{Condition, Scope};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::debug;

/// Filter clause of a select
///
/// Either one condition, or several conditions combined by a statement
/// that refers to their results as `$0`, `$1`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Where {
    /// A single condition; empty matches everything
    Condition(String),
    /// Sub-conditions combined positionally
    Compound {
        /// Evaluated against each document
        conditions: Vec<String>,
        /// Evaluated against the list of condition results
        statement: String,
    },
}

impl Default for Where {
    fn default() -> Self {
        Where::Condition(String::new())
    }
}

impl From<&str> for Where {
    fn from(s: &str) -> Self {
        Where::Condition(s.to_string())
    }
}

/// Sort clause of a select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Condition producing the sort key
    pub by: String,
    /// Sort largest first
    #[serde(default)]
    pub descending: bool,
}

/// Options accepted by select
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    /// Filter clause
    #[serde(rename = "where")]
    pub filter: Where,
    /// Result cap; `None` uses the configured default
    pub max_results: Option<i64>,
    /// Inject each document's key as `key`
    pub show_keys: bool,
    /// Replace foreign keys with their documents
    pub expand_keys: bool,
    /// Reshape results through an alias tree
    pub alias: Option<Alias>,
    /// Sort results
    pub order: Option<Order>,
}

impl SelectOptions {
    /// Options matching `filter` with every other field at its default
    pub fn filtered(filter: impl Into<Where>) -> Self {
        SelectOptions {
            filter: filter.into(),
            ..Default::default()
        }
    }
}

/// A parsed [`Where`]
#[derive(Debug, Clone)]
pub enum Filter {
    /// Match everything
    All,
    /// One condition
    Condition(Condition),
    /// Positional combination of conditions
    Compound {
        /// Sub-conditions
        conditions: Vec<Condition>,
        /// Combining statement
        statement: Condition,
    },
}

impl Filter {
    /// Parse a where clause
    pub fn compile(clause: &Where) -> Result<Self> {
        Ok(match clause {
            Where::Condition(source) if source.trim().is_empty() => Filter::All,
            Where::Condition(source) => Filter::Condition(Condition::parse(source)?),
            Where::Compound {
                conditions,
                statement,
            } => Filter::Compound {
                conditions: conditions
                    .iter()
                    .map(|c| Condition::parse(c))
                    .collect::<std::result::Result<_, _>>()?,
                statement: Condition::parse(statement)?,
            },
        })
    }

    /// Test a document
    pub fn matches(&self, document: &Document) -> std::result::Result<bool, QueryError> {
        match self {
            Filter::All => Ok(true),
            Filter::Condition(condition) => condition.matches(document),
            Filter::Compound {
                conditions,
                statement,
            } => {
                let scope = Scope::Document(document);
                let values = conditions
                    .iter()
                    .map(|c| c.evaluate(&scope))
                    .collect::<std::result::Result<Vec<Node>, _>>()?;
                Ok(statement.evaluate(&Scope::Values(&values))?.is_truthy())
            }
        }
    }
}

/// Keys of every document in `table` matching `filter`, in scan order
pub fn matching_keys(session: &mut Session<'_>, table: &str, filter: &Filter) -> Result<Vec<DocKey>> {
    let chunks = session.meta().table(table)?.chunks.clone();
    let mut keys = Vec::new();
    for id in &chunks {
        for (key, document) in session.chunk(id)? {
            if filter.matches(document)? {
                keys.push(key.clone());
            }
        }
    }
    Ok(keys)
}

/// Run a select against `table`
pub fn select(
    session: &mut Session<'_>,
    table: &str,
    options: &SelectOptions,
    default_max_results: i64,
) -> Result<Vec<Document>> {
    let started = Instant::now();
    let chunks = session.meta().table(table)?.chunks.clone();

    let filter = Filter::compile(&options.filter)?;
    let projection = options.alias.as_ref().map(Projection::compile).transpose()?;
    let order = options
        .order
        .as_ref()
        .map(|o| Condition::parse(&o.by))
        .transpose()?;
    let max_results = options.max_results.unwrap_or(default_max_results);
    let cutoff = match order {
        Some(_) => None,
        None => usize::try_from(max_results).ok(),
    };
    let full = |results: &[Document]| cutoff.is_some_and(|n| results.len() >= n);

    let mut results: Vec<Document> = Vec::new();
    let mut scanned = 0usize;

    'chunks: for id in &chunks {
        if full(&results) {
            break;
        }
        scanned += 1;
        let keys: Vec<DocKey> = session.chunk(id)?.keys().cloned().collect();
        for key in keys {
            if full(&results) {
                break 'chunks;
            }
            let document = match session.chunk(id)?.get(&key) {
                Some(document) if filter.matches(document)? => document.clone(),
                _ => continue,
            };
            results.push(shape(session, &key, document, options, projection.as_ref())?);
        }
    }

    if let Some(order) = order {
        let descending = options.order.as_ref().is_some_and(|o| o.descending);
        results = sort_by_condition(results, &order, descending)?;
        if let Some(n) = usize::try_from(max_results).ok().filter(|n| *n > 0) {
            results.truncate(n);
        }
    }

    debug!(
        target: "crumb::query",
        tenant = session.tenant(),
        table,
        chunks = scanned,
        results = results.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Select"
    );
    Ok(results)
}

fn shape(
    session: &mut Session<'_>,
    key: &str,
    document: Document,
    options: &SelectOptions,
    projection: Option<&Projection>,
) -> Result<Document> {
    let mut document = document;
    if options.expand_keys {
        document = expand(session, &document, Some(key))?;
    }
    if let Some(projection) = projection {
        document = projection.project(&document)?;
        if options.expand_keys {
            document = expand(session, &document, Some(key))?;
        }
    }
    if options.show_keys {
        document.insert(RESERVED_KEY_FIELD.to_string(), Node::from(key));
    }
    Ok(document)
}

fn sort_by_condition(
    documents: Vec<Document>,
    order: &Condition,
    descending: bool,
) -> Result<Vec<Document>> {
    let mut keyed = Vec::with_capacity(documents.len());
    for document in documents {
        let key = order.evaluate(&Scope::Document(&document))?;
        if key.is_null() {
            return Err(QueryError::NullOrderKey.into());
        }
        keyed.push((key, document));
    }

    // Stable sort; ties keep scan order in both directions.
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    Ok(keyed.into_iter().map(|(_, d)| d).collect())
}

fn rank(node: &Node) -> u8 {
    match node {
        Node::Leaf(Value::Null) => 0,
        Node::Leaf(Value::Bool(_)) => 1,
        Node::Leaf(Value::Number(_)) => 2,
        Node::Leaf(Value::String(_)) => 3,
        Node::Object(_) => 4,
    }
}

fn compare_keys(a: &Node, b: &Node) -> Ordering {
    match (a, b) {
        (Node::Leaf(Value::Bool(x)), Node::Leaf(Value::Bool(y))) => x.cmp(y),
        (Node::Leaf(Value::Number(x)), Node::Leaf(Value::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Node::Leaf(Value::String(x)), Node::Leaf(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
