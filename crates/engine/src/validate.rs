//! Schema validation
//!
//! [`validate_document`] checks a document's shape and leaf types against a
//! schema. Uniqueness is not checked here; see [`crate::index`].
//!
//! [`validate_schema`] checks a schema definition before it is stored.

use crumb_core::{
    Document, FieldSpec, FieldType, Meta, Node, Schema, SchemaNode, ValidationError, Value,
    RESERVED_KEY_FIELD,
};

/// Reject documents carrying the reserved `key` field
pub fn check_reserved_key(document: &Document) -> Result<(), ValidationError> {
    if document.contains_key(RESERVED_KEY_FIELD) {
        return Err(ValidationError::ReservedKey);
    }
    Ok(())
}

/// Validate a document against a schema.
///
/// The document's field set must equal the schema's exactly, at every
/// level. Foreign keys must name a document present in `meta.key_index`.
pub fn validate_document(
    document: &Document,
    schema: &Schema,
    meta: &Meta,
) -> Result<(), ValidationError> {
    check_reserved_key(document)?;

    // BTreeMap keys iterate sorted, so order of definition is irrelevant.
    if !document.keys().eq(schema.keys()) {
        return Err(ValidationError::KeyMismatch {
            expected: schema.keys().cloned().collect(),
            actual: document.keys().cloned().collect(),
        });
    }

    for (field, spec) in schema {
        let Some(value) = document.get(field) else {
            continue;
        };

        match (spec, value) {
            (SchemaNode::Object(sub), Node::Object(sub_doc)) => {
                validate_document(sub_doc, sub, meta)?;
            }
            (SchemaNode::Object(_), Node::Leaf(v)) => {
                return Err(ValidationError::ExpectedObject {
                    field: field.clone(),
                    expected: spec.to_string(),
                    actual: v.to_string(),
                });
            }
            (SchemaNode::Leaf(raw), Node::Object(_)) => {
                return Err(ValidationError::ExpectedScalar {
                    field: field.clone(),
                    spec: raw.clone(),
                });
            }
            (SchemaNode::Leaf(raw), Node::Leaf(v)) => {
                validate_leaf(field, &FieldSpec::parse(raw)?, v, meta)?;
            }
        }
    }

    Ok(())
}

fn validate_leaf(
    field: &str,
    spec: &FieldSpec,
    value: &Value,
    meta: &Meta,
) -> Result<(), ValidationError> {
    if spec.nullable && value.is_null() {
        return Ok(());
    }

    let ok = match (spec.field_type, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Boolean, Value::Bool(_)) => true,
        (FieldType::Number, Value::Number(_)) => true,
        (FieldType::ForeignKey, Value::String(key)) => {
            if !meta.contains_key(key) {
                return Err(ValidationError::UnresolvedForeignKey {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            true
        }
        (FieldType::ForeignKey, _) => {
            return Err(ValidationError::UnresolvedForeignKey {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        _ => false,
    };

    if !ok {
        return Err(ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: spec.field_type.to_string(),
            actual: value.to_string(),
        });
    }

    Ok(())
}

/// Validate a schema definition.
///
/// Rejects field names containing `.` or `,`, fields named `key`, and leaf
/// specs that [`FieldSpec::parse`] rejects.
pub fn validate_schema(schema: &Schema) -> Result<(), ValidationError> {
    for (field, node) in schema {
        if field.contains('.') || field.contains(',') {
            return Err(ValidationError::IllegalFieldName {
                field: field.clone(),
            });
        }
        if field == RESERVED_KEY_FIELD {
            return Err(ValidationError::ReservedFieldName);
        }

        match node {
            SchemaNode::Object(sub) => validate_schema(sub)?,
            SchemaNode::Leaf(spec) => {
                FieldSpec::parse(spec)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn schema(json: serde_json::Value) -> Schema {
        serde_json::from_value(json).unwrap()
    }

    fn doc(json: serde_json::Value) -> Document {
        serde_json::from_value(json).unwrap()
    }

    fn meta_with_key(key: &str) -> Meta {
        let mut meta = Meta::new();
        meta.key_index.insert(key.into(), "c".into());
        meta
    }

    #[test]
    fn test_accepts_matching_document() {
        let s = schema(serde_json::json!({
            "name": "string",
            "age": "number",
            "good": "boolean",
            "owner": {"name": "nullable string"}
        }));
        let d = doc(serde_json::json!({
            "name": "Yogi",
            "age": 12,
            "good": true,
            "owner": {"name": null}
        }));
        validate_document(&d, &s, &Meta::new()).unwrap();
    }

    #[test]
    fn test_key_mismatch_lists_both_sets() {
        let s = schema(serde_json::json!({"name": "string", "age": "number"}));
        let d = doc(serde_json::json!({"name": "Yogi", "colour": "brown"}));
        match validate_document(&d, &s, &Meta::new()) {
            Err(ValidationError::KeyMismatch { expected, actual }) => {
                assert_eq!(expected, vec!["age", "name"]);
                assert_eq!(actual, vec!["colour", "name"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let d = doc(serde_json::json!({"name": "Yogi"}));
        assert!(matches!(
            validate_document(&d, &s, &Meta::new()),
            Err(ValidationError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_reserved_key() {
        let s = schema(serde_json::json!({"name": "string"}));
        let d = doc(serde_json::json!({"name": "Yogi", "key": "x"}));
        assert_eq!(
            validate_document(&d, &s, &Meta::new()),
            Err(ValidationError::ReservedKey)
        );
    }

    #[test]
    fn test_type_mismatch() {
        let s = schema(serde_json::json!({"age": "number"}));
        for bad in [
            serde_json::json!({"age": "12"}),
            serde_json::json!({"age": true}),
            serde_json::json!({"age": null}),
        ] {
            assert!(matches!(
                validate_document(&doc(bad), &s, &Meta::new()),
                Err(ValidationError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let s = schema(serde_json::json!({"owner": {"name": "string"}}));
        assert!(matches!(
            validate_document(&doc(serde_json::json!({"owner": "Ann"})), &s, &Meta::new()),
            Err(ValidationError::ExpectedObject { .. })
        ));
        // null is not an object, even for nested schemas
        assert!(matches!(
            validate_document(&doc(serde_json::json!({"owner": null})), &s, &Meta::new()),
            Err(ValidationError::ExpectedObject { .. })
        ));

        let s = schema(serde_json::json!({"owner": "string"}));
        assert!(matches!(
            validate_document(
                &doc(serde_json::json!({"owner": {"name": "Ann"}})),
                &s,
                &Meta::new()
            ),
            Err(ValidationError::ExpectedScalar { .. })
        ));
    }

    #[test]
    fn test_nested_errors_surface() {
        let s = schema(serde_json::json!({"owner": {"age": "number"}}));
        let d = doc(serde_json::json!({"owner": {"age": "old"}}));
        match validate_document(&d, &s, &Meta::new()) {
            Err(ValidationError::TypeMismatch { field, .. }) => assert_eq!(field, "age"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_foreign_keys() {
        let s = schema(serde_json::json!({"owner": "foreign_key"}));
        let meta = meta_with_key("k1");

        validate_document(&doc(serde_json::json!({"owner": "k1"})), &s, &meta).unwrap();
        for bad in [
            serde_json::json!({"owner": "k2"}),
            serde_json::json!({"owner": 1}),
            serde_json::json!({"owner": null}),
        ] {
            assert!(matches!(
                validate_document(&doc(bad), &s, &meta),
                Err(ValidationError::UnresolvedForeignKey { .. })
            ));
        }

        let s = schema(serde_json::json!({"owner": "nullable foreign_key"}));
        validate_document(&doc(serde_json::json!({"owner": null})), &s, &meta).unwrap();
    }

    #[test]
    fn test_schema_definition() {
        validate_schema(&schema(serde_json::json!({
            "name": "unique string",
            "owner": {"id": "nullable foreign_key"}
        })))
        .unwrap();

        let cases = [
            serde_json::json!({"a.b": "string"}),
            serde_json::json!({"a,b": "string"}),
            serde_json::json!({"key": "string"}),
            serde_json::json!({"nested": {"key": "string"}}),
            serde_json::json!({"a": "unique unique string"}),
            serde_json::json!({"a": "nullable unique"}),
            serde_json::json!({"a": "string indexed"}),
            serde_json::json!({"a": ""}),
        ];
        for bad in cases {
            assert!(validate_schema(&schema(bad.clone())).is_err(), "{}", bad);
        }
    }

    proptest! {
        #[test]
        fn prop_field_order_is_irrelevant(
            fields in prop::collection::vec("[a-z]{1,6}", 1..8),
        ) {
            prop_assume!(!fields.iter().any(|f| f == RESERVED_KEY_FIELD));
            let mut s = Schema::new();
            let mut forward = serde_json::Map::new();
            for f in &fields {
                s.insert(f.clone(), SchemaNode::Leaf("number".into()));
                forward.insert(f.clone(), serde_json::json!(1));
            }
            let mut reversed = serde_json::Map::new();
            for f in fields.iter().rev() {
                reversed.insert(f.clone(), serde_json::json!(1));
            }

            let a = doc(serde_json::Value::Object(forward));
            let b = doc(serde_json::Value::Object(reversed));
            prop_assert!(validate_document(&a, &s, &Meta::new()).is_ok());
            prop_assert!(validate_document(&b, &s, &Meta::new()).is_ok());
        }
    }
}
