//! Foreign-key expansion and alias projection
//!
//! [`expand`] replaces every string field naming a stored document with that
//! document, recursively. Keys already on the recursion path are left as
//! strings, which cuts reference cycles.
//!
//! [`Projection`] maps a document to the shape of an alias tree whose leaves
//! are conditions evaluated against the source document.

use crate::session::DocumentSource;
use crumb_core::{Document, Node, Result, Value};
use crumb_query::{Condition, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Expand foreign keys in `document`.
///
/// `root` is the key of `document` itself, if it has one; a reference back
/// to it is not expanded.
pub fn expand(
    source: &mut dyn DocumentSource,
    document: &Document,
    root: Option<&str>,
) -> Result<Document> {
    let mut path: Vec<String> = root.map(|r| vec![r.to_string()]).unwrap_or_default();
    expand_with_path(source, document, &mut path)
}

fn expand_with_path(
    source: &mut dyn DocumentSource,
    document: &Document,
    path: &mut Vec<String>,
) -> Result<Document> {
    let mut out = Document::new();

    for (field, node) in document {
        let expanded = match node {
            Node::Object(sub) => Node::Object(expand_with_path(source, sub, path)?),
            Node::Leaf(Value::String(key)) if source.contains_key(key) => {
                if path.iter().any(|k| k == key) {
                    warn!(target: "crumb::ops", key = %key, field = %field, "Foreign key cycle left unexpanded");
                    node.clone()
                } else {
                    match source.document(key)? {
                        Some(target) => {
                            path.push(key.clone());
                            let result = expand_with_path(source, &target, path);
                            path.pop();
                            Node::Object(result?)
                        }
                        None => node.clone(),
                    }
                }
            }
            Node::Leaf(_) => node.clone(),
        };
        out.insert(field.clone(), expanded);
    }

    Ok(out)
}

/// Alias tree: field name to expression or nested alias
pub type Alias = BTreeMap<String, AliasNode>;

/// One node of an alias tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasNode {
    /// Condition evaluated against the source document
    Expr(String),
    /// Nested alias producing a sub-document
    Object(Alias),
}

/// An alias tree with every expression parsed
#[derive(Debug, Clone)]
pub struct Projection {
    fields: Vec<(String, ProjectionNode)>,
}

#[derive(Debug, Clone)]
enum ProjectionNode {
    Expr(Condition),
    Object(Projection),
}

impl Projection {
    /// Parse every expression of `alias`
    pub fn compile(alias: &Alias) -> Result<Self> {
        let mut fields = Vec::with_capacity(alias.len());
        for (name, node) in alias {
            let compiled = match node {
                AliasNode::Expr(source) => ProjectionNode::Expr(Condition::parse(source)?),
                AliasNode::Object(sub) => ProjectionNode::Object(Projection::compile(sub)?),
            };
            fields.push((name.clone(), compiled));
        }
        Ok(Projection { fields })
    }

    /// Build the aliased document
    pub fn project(&self, document: &Document) -> Result<Document> {
        let scope = Scope::Document(document);
        let mut out = Document::new();
        for (name, node) in &self.fields {
            let value = match node {
                ProjectionNode::Expr(condition) => condition.evaluate(&scope)?,
                ProjectionNode::Object(sub) => Node::Object(sub.project(document)?),
            };
            out.insert(name.clone(), value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumb_core::{Error, QueryError};
    use std::collections::HashMap;

    struct Docs(HashMap<String, Document>);

    impl DocumentSource for Docs {
        fn contains_key(&self, key: &str) -> bool {
            self.0.contains_key(key)
        }

        fn document(&mut self, key: &str) -> Result<Option<Document>> {
            Ok(self.0.get(key).cloned())
        }
    }

    fn doc(json: serde_json::Value) -> Document {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_expands_nested_references() {
        let mut docs = Docs(HashMap::from([
            ("p1".to_string(), doc(serde_json::json!({"name": "Ann", "home": "h1"}))),
            ("h1".to_string(), doc(serde_json::json!({"city": "Oslo"}))),
        ]));
        let dog = doc(serde_json::json!({"name": "Yogi", "meta": {"owner": "p1"}, "tag": "none"}));

        let expanded = expand(&mut docs, &dog, None).unwrap();
        assert_eq!(
            expanded,
            doc(serde_json::json!({
                "name": "Yogi",
                "meta": {"owner": {"name": "Ann", "home": {"city": "Oslo"}}},
                "tag": "none"
            }))
        );
    }

    #[test]
    fn test_cycle_is_cut() {
        let mut docs = Docs(HashMap::from([
            ("a".to_string(), doc(serde_json::json!({"next": "b"}))),
            ("b".to_string(), doc(serde_json::json!({"next": "a"}))),
        ]));
        let a = docs.0["a"].clone();

        let expanded = expand(&mut docs, &a, Some("a")).unwrap();
        assert_eq!(expanded, doc(serde_json::json!({"next": {"next": "a"}})));

        // Self reference
        let mut docs = Docs(HashMap::from([(
            "s".to_string(),
            doc(serde_json::json!({"me": "s"})),
        )]));
        let s = docs.0["s"].clone();
        assert_eq!(expand(&mut docs, &s, Some("s")).unwrap(), s);
    }

    #[test]
    fn test_sibling_references_both_expand() {
        let mut docs = Docs(HashMap::from([(
            "p".to_string(),
            doc(serde_json::json!({"n": 1})),
        )]));
        let d = doc(serde_json::json!({"a": "p", "b": "p"}));
        let expanded = expand(&mut docs, &d, None).unwrap();
        assert_eq!(expanded, doc(serde_json::json!({"a": {"n": 1}, "b": {"n": 1}})));
    }

    #[test]
    fn test_projection() {
        let alias: Alias = serde_json::from_value(serde_json::json!({
            "title": "to_upper($name)",
            "senior": "gt($age, 10)",
            "nested": {"years": "$age", "const": "'x'"}
        }))
        .unwrap();
        let projection = Projection::compile(&alias).unwrap();
        let out = projection
            .project(&doc(serde_json::json!({"name": "Yogi", "age": 12})))
            .unwrap();
        assert_eq!(
            out,
            doc(serde_json::json!({
                "title": "YOGI",
                "senior": true,
                "nested": {"years": 12, "const": "x"}
            }))
        );
    }

    #[test]
    fn test_projection_errors() {
        let alias: Alias =
            serde_json::from_value(serde_json::json!({"x": "gt("})).unwrap();
        assert!(matches!(
            Projection::compile(&alias),
            Err(Error::MalformedQuery(_))
        ));

        let alias: Alias =
            serde_json::from_value(serde_json::json!({"x": "$missing"})).unwrap();
        let projection = Projection::compile(&alias).unwrap();
        assert!(matches!(
            projection.project(&Document::new()),
            Err(Error::MalformedQuery(QueryError::InvalidProperty { .. }))
        ));
    }
}
