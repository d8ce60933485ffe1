//! Condition language for crumb
//!
//! Conditions filter documents, compute ordering keys and alias fields, and
//! combine sub-query results:
//!
//! ```text
//! and(eq($species, 'dog'), gt($age, 10))
//! if_else(gt($age, 10), 'senior', 'junior')
//! or($0, not($1))
//! ```
//!
//! A condition is parsed once into an [`Expr`] and evaluated against a
//! [`Scope`] per document.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod eval;
pub mod parser;
pub mod time;

pub use ast::{Expr, Reference};
pub use builtins::Builtin;
pub use eval::Scope;
pub use parser::parse;

use crumb_core::{Document, Node, QueryError};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// A parsed condition together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Parse a condition
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let expr = parse(source)?;
        trace!(target: "crumb::query", source, "Parsed condition");
        Ok(Condition {
            source: source.to_string(),
            expr,
        })
    }

    /// Source text as given
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against a scope
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Node, QueryError> {
        self.expr.evaluate(scope)
    }

    /// Evaluate against a document and test the result for truthiness
    pub fn matches(&self, document: &Document) -> Result<bool, QueryError> {
        Ok(self.evaluate(&Scope::Document(document))?.is_truthy())
    }
}

impl FromStr for Condition {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parse and evaluate in one step
pub fn evaluate(source: &str, scope: &Scope<'_>) -> Result<Node, QueryError> {
    parse(source)?.evaluate(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_matches() {
        let doc: Document =
            serde_json::from_value(serde_json::json!({"name": "Yogi", "age": 12})).unwrap();
        let cond: Condition = "and(eq($name, 'Yogi'), gt($age, 10))".parse().unwrap();
        assert!(cond.matches(&doc).unwrap());

        let cond = Condition::parse("starts_with($name, 'Bo')").unwrap();
        assert!(!cond.matches(&doc).unwrap());
        assert_eq!(cond.to_string(), "starts_with($name, 'Bo')");
    }

    #[test]
    fn test_condition_value_truthiness() {
        let doc: Document =
            serde_json::from_value(serde_json::json!({"name": "", "age": 0})).unwrap();
        assert!(!Condition::parse("$name").unwrap().matches(&doc).unwrap());
        assert!(!Condition::parse("$age").unwrap().matches(&doc).unwrap());
        assert!(Condition::parse("add($age, 1)").unwrap().matches(&doc).unwrap());
    }
}
