//! Tree-walking evaluator

use crate::ast::{Expr, Reference};
use crate::builtins;
use crumb_core::{Document, Node, QueryError};

/// What `$` references resolve against
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Field paths into a document
    Document(&'a Document),
    /// Positions into a list of sub-query results
    Values(&'a [Node]),
}

impl Default for Scope<'_> {
    fn default() -> Self {
        Scope::Values(&[])
    }
}

impl<'a> Scope<'a> {
    /// Resolve a reference to a copy of the node it names
    pub fn resolve(&self, reference: &Reference) -> Result<Node, QueryError> {
        let invalid = || QueryError::InvalidProperty {
            reference: reference.to_string(),
        };

        let (first, rest) = reference.segments().split_first().ok_or_else(invalid)?;

        let mut node = match self {
            Scope::Document(doc) => doc.get(first).ok_or_else(invalid)?,
            Scope::Values(values) => {
                let index: usize = first.parse().map_err(|_| invalid())?;
                values.get(index).ok_or(QueryError::PositionalOutOfRange {
                    index,
                    len: values.len(),
                })?
            }
        };

        for segment in rest {
            node = node
                .as_object()
                .and_then(|obj| obj.get(segment))
                .ok_or_else(invalid)?;
        }

        Ok(node.clone())
    }
}

impl Expr {
    /// Evaluate bottom-up: arguments first, then the call.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Node, QueryError> {
        match self {
            Expr::Literal(value) => Ok(Node::Leaf(value.clone())),
            Expr::Reference(reference) => scope.resolve(reference),
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(scope))
                    .collect::<Result<Vec<_>, _>>()?;
                builtins::call(name, values)
            }
        }
    }
}
