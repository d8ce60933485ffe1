//! Schema types
//!
//! A schema mirrors the shape of the documents it describes. Each leaf is a
//! field spec string made of space-separated tokens: exactly one type token
//! (`string`, `boolean`, `number`, `foreign_key`) plus the optional,
//! order-independent modifiers `nullable` and `unique`.
//!
//! ```text
//! { "name": "unique string", "owner": { "id": "nullable foreign_key" } }
//! ```
//!
//! Leaves are kept as the raw spec strings the caller supplied so that a
//! stored schema reads back exactly as it was defined. [`FieldSpec::parse`]
//! turns a spec string into its typed form.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A schema: field name to leaf spec or nested schema
pub type Schema = BTreeMap<String, SchemaNode>;

/// One node of a schema tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// Field spec string, e.g. `"unique nullable string"`
    Leaf(String),
    /// Nested schema
    Object(Schema),
}

impl SchemaNode {
    /// Get the spec string if this is a leaf
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            SchemaNode::Leaf(s) => Some(s),
            SchemaNode::Object(_) => None,
        }
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaNode::Leaf(spec) => write!(f, "{:?}", spec),
            SchemaNode::Object(schema) => {
                write!(f, "{{")?;
                for (i, (k, v)) in schema.iter().enumerate() {
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

/// Leaf type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Boolean
    Boolean,
    /// Number
    Number,
    /// String naming the key of another document in the same tenant
    ForeignKey,
}

impl FieldType {
    /// Parse a type token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(FieldType::String),
            "boolean" => Some(FieldType::Boolean),
            "number" => Some(FieldType::Number),
            "foreign_key" => Some(FieldType::ForeignKey),
            _ => None,
        }
    }

    /// Token used in spec strings
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::ForeignKey => "foreign_key",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifier token: nullable
pub const NULLABLE: &str = "nullable";
/// Modifier token: unique
pub const UNIQUE: &str = "unique";

/// Parsed form of a leaf spec string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Leaf type
    pub field_type: FieldType,
    /// Null is accepted in place of a typed value
    pub nullable: bool,
    /// Values are tracked in the table's uniqueness index
    pub unique: bool,
}

impl FieldSpec {
    /// Parse and validate a spec string.
    ///
    /// Tokens are separated by single spaces. Rejects specs with no type
    /// token, repeated tokens, or tokens outside the known set. When several
    /// type tokens are present the first one wins.
    pub fn parse(spec: &str) -> Result<FieldSpec, ValidationError> {
        let tokens: Vec<&str> = spec.split(' ').collect();

        let field_type = tokens
            .iter()
            .find_map(|t| FieldType::from_token(t))
            .ok_or_else(|| ValidationError::MissingType {
                spec: spec.to_string(),
            })?;

        for (i, token) in tokens.iter().enumerate() {
            if tokens[..i].contains(token) {
                return Err(ValidationError::DuplicateModifier {
                    spec: spec.to_string(),
                });
            }
        }

        for token in &tokens {
            if FieldType::from_token(token).is_none() && *token != NULLABLE && *token != UNIQUE {
                return Err(ValidationError::UnknownModifier {
                    token: token.to_string(),
                    spec: spec.to_string(),
                });
            }
        }

        Ok(FieldSpec {
            field_type,
            nullable: tokens.contains(&NULLABLE),
            unique: tokens.contains(&UNIQUE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_types() {
        for (spec, ty) in [
            ("string", FieldType::String),
            ("boolean", FieldType::Boolean),
            ("number", FieldType::Number),
            ("foreign_key", FieldType::ForeignKey),
        ] {
            let parsed = FieldSpec::parse(spec).unwrap();
            assert_eq!(parsed.field_type, ty);
            assert!(!parsed.nullable);
            assert!(!parsed.unique);
        }
    }

    #[test]
    fn test_parse_modifiers_any_order() {
        for spec in [
            "unique nullable string",
            "nullable unique string",
            "string unique nullable",
            "string nullable unique",
        ] {
            let parsed = FieldSpec::parse(spec).unwrap();
            assert_eq!(parsed.field_type, FieldType::String);
            assert!(parsed.nullable);
            assert!(parsed.unique);
        }
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        assert!(matches!(
            FieldSpec::parse("unique nullable"),
            Err(ValidationError::MissingType { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        assert!(matches!(
            FieldSpec::parse("unique string unique"),
            Err(ValidationError::DuplicateModifier { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        match FieldSpec::parse("string indexed") {
            Err(ValidationError::UnknownModifier { token, .. }) => assert_eq!(token, "indexed"),
            other => panic!("unexpected: {:?}", other),
        }
        // Double spaces leave an empty token behind.
        assert!(FieldSpec::parse("string  unique").is_err());
    }

    #[test]
    fn test_schema_json_shape() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "name": "unique string",
            "owner": { "id": "nullable foreign_key" }
        }))
        .unwrap();

        assert_eq!(schema["name"].as_leaf(), Some("unique string"));
        match &schema["owner"] {
            SchemaNode::Object(inner) => {
                assert_eq!(inner["id"].as_leaf(), Some("nullable foreign_key"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
