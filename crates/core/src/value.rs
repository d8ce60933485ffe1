//! Value types for documents
//!
//! This module defines:
//! - Value: the tagged scalar stored in document leaves
//! - Node: a document field, either a scalar leaf or a nested document
//! - Document: an ordered mapping from field name to Node
//!
//! ## Value Model
//!
//! Exactly four scalar variants exist: Null, Bool, Number, String.
//! Numbers are always `f64`; there is no separate integer type.
//!
//! Values serialize untagged, so a document encodes as a plain nested map
//! (`{"name": "Yogi", "age": 12, "owner": {"id": null}}`) under any
//! self-describing format.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A document: field name to value or nested document.
///
/// `BTreeMap` keeps iteration order stable across reads and writes.
pub type Document = BTreeMap<String, Node>;

/// Reserved field name injected at read time when keys are requested.
pub const RESERVED_KEY_FIELD: &str = "key";

/// Scalar stored in a document leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit floating point (IEEE-754); integral values serialize as integers
    #[serde(serialize_with = "serialize_number")]
    Number(f64),
    /// UTF-8 string
    String(String),
}

/// Largest magnitude below which every integer is exact in an f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let integral = n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER;
    // -0.0 keeps its sign
    if integral && !(*n == 0.0 && n.is_sign_negative()) {
        serializer.serialize_i64(*n as i64)
    } else {
        serializer.serialize_f64(*n)
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as f64 if this is a Number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by filters and logical builtins.
    ///
    /// `null`, `false`, `0`, `NaN` and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Token under which this value is stored in a uniqueness index.
    ///
    /// `null`, `true` and `false` map to their literal names so they share
    /// one value-to-key map with strings. Numbers use their display form,
    /// which means `1` and `"1"` collide.
    pub fn index_token(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

// ============================================================================
// Node
// ============================================================================

/// A document field: a scalar leaf or a nested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Scalar leaf
    Leaf(Value),
    /// Nested document
    Object(Document),
}

impl Node {
    /// Null leaf
    pub const NULL: Node = Node::Leaf(Value::Null);

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Leaf(v) => v.type_name(),
            Node::Object(_) => "object",
        }
    }

    /// Get the scalar if this is a leaf
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Object(_) => None,
        }
    }

    /// Get the nested document if this is an object
    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Node::Object(d) => Some(d),
            Node::Leaf(_) => None,
        }
    }

    /// Check if this is a null leaf
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Leaf(Value::Null))
    }

    /// Get as f64 if this is a Number leaf
    pub fn as_number(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_number)
    }

    /// Get as &str if this is a String leaf
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Objects are always truthy; leaves follow [`Value::is_truthy`].
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Leaf(v) => v.is_truthy(),
            Node::Object(_) => true,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(v) => write!(f, "{}", v),
            Node::Object(doc) => {
                write!(f, "{{")?;
                for (i, (k, v)) in doc.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::Leaf(v)
    }
}

macro_rules! node_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(v: $t) -> Self {
                    Node::Leaf(Value::from(v))
                }
            }
        )*
    };
}

node_from_scalar!(&str, String, f64, i64, i32, bool);

impl From<Document> for Node {
    fn from(d: Document) -> Self {
        Node::Object(d)
    }
}

/// Resolve a dotted field path inside a document.
///
/// Returns `None` when a segment is missing or the walk hits a leaf
/// before the last segment.
pub fn lookup<'a, S: AsRef<str>>(document: &'a Document, path: &[S]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = document.get(first.as_ref())?;
    for segment in rest {
        node = node.as_object()?.get(segment.as_ref())?;
    }
    Some(node)
}
