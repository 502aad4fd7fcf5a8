//! Tagged representation of raw schema nodes.
//!
//! A raw node is a JSON object whose meaning depends on which keywords are
//! present. [`SchemaNode::parse`] settles that precedence once, so type
//! resolution is a plain match over the variants.

use serde_json::{Map, Value};

/// Vendor extension that overrides the resolved type verbatim.
pub const TYPE_OVERRIDE_KEY: &str = "x-type";

/// Vendor extension marking a node as nullable.
pub const NULLABLE_KEY: &str = "x-nullable";

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// JSON `null`, `"type": null` or `"type": "null"`.
    Null,
    /// `$ref` to a named definition; holds the raw reference.
    Ref(String),
    /// `x-type` override, verbatim.
    TypeOverride(String),
    /// `x-nullable: true` around the rest of the node.
    Nullable(Box<SchemaNode>),
    /// `anyOf` / `oneOf` without an explicit `type`.
    Union(Vec<SchemaNode>),
    /// `allOf` without an explicit `type`, nullable branches removed.
    Intersection(Vec<SchemaNode>),
    /// `"type": [..]` listing several primitive types.
    MultiType(Vec<SchemaNode>),
    String {
        literals: Vec<String>,
        constant: Option<String>,
    },
    Number {
        literals: Vec<String>,
        constant: Option<String>,
    },
    Boolean,
    Array(ArrayItems),
    /// Swagger `file` type.
    File,
    Object(ObjectShape),
    /// Unknown or unconstrained type.
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItems {
    /// `items` is a single schema (or missing).
    List(Box<SchemaNode>),
    /// `items` is an array of positional schemas.
    Tuple {
        items: Vec<SchemaNode>,
        min_items: usize,
        max_items: Option<usize>,
        additional: Option<Box<SchemaNode>>,
    },
}

/// Declared members of an inline or named object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub properties: Vec<(String, SchemaNode)>,
    pub required: Vec<String>,
    pub additional: Option<Box<SchemaNode>>,
}

impl ObjectShape {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Reads `properties`, `required` and `additionalProperties` from `map`.
    /// `additionalProperties: true` becomes [`SchemaNode::Any`].
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let properties = map
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), SchemaNode::parse(prop)))
                    .collect()
            })
            .unwrap_or_default();
        ObjectShape {
            properties,
            required: string_list(map.get("required")),
            additional: additional_properties(map.get("additionalProperties")),
        }
    }
}

impl SchemaNode {
    /// Parse a raw node, applying keyword precedence.
    pub fn parse(value: &Value) -> SchemaNode {
        match value {
            Value::Object(map) => Self::parse_object(map),
            Value::Null => SchemaNode::Null,
            // `true` / `false` schemas and stray scalars carry no type
            _ => SchemaNode::Any,
        }
    }

    fn parse_object(map: &Map<String, Value>) -> SchemaNode {
        let ty = map.get("type");
        if matches!(ty, Some(Value::Null)) {
            return SchemaNode::Null;
        }

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            return SchemaNode::Ref(reference.to_string());
        }

        match map.get(TYPE_OVERRIDE_KEY) {
            Some(Value::String(s)) => return SchemaNode::TypeOverride(s.clone()),
            Some(other) if is_truthy(Some(other)) => {
                return SchemaNode::TypeOverride(other.to_string())
            }
            _ => {}
        }

        if is_truthy(map.get(NULLABLE_KEY)) {
            let mut inner = map.clone();
            inner.remove(NULLABLE_KEY);
            return SchemaNode::Nullable(Box::new(Self::parse_object(&inner)));
        }

        if ty.is_none() {
            if let Some(Value::Array(variants)) = map.get("anyOf").or_else(|| map.get("oneOf")) {
                return SchemaNode::Union(variants.iter().map(SchemaNode::parse).collect());
            }
            if let Some(Value::Array(branches)) = map.get("allOf") {
                return SchemaNode::Intersection(
                    branches
                        .iter()
                        .filter(|b| !is_truthy(b.get(NULLABLE_KEY)))
                        .map(SchemaNode::parse)
                        .collect(),
                );
            }
        }

        if let Some(Value::Array(types)) = ty {
            let variants = types
                .iter()
                .map(|t| {
                    let mut single = map.clone();
                    single.insert("type".to_string(), t.clone());
                    Self::parse_object(&single)
                })
                .collect();
            return SchemaNode::MultiType(variants);
        }

        match ty.and_then(Value::as_str) {
            Some("null") => SchemaNode::Null,
            Some("string") => SchemaNode::String {
                literals: literal_list(map.get("enum")),
                constant: map.get("const").map(literal_text),
            },
            Some("integer") | Some("number") => SchemaNode::Number {
                literals: literal_list(map.get("enum")),
                constant: map.get("const").map(literal_text),
            },
            Some("boolean") => SchemaNode::Boolean,
            Some("array") => SchemaNode::Array(Self::parse_items(map)),
            Some("file") => SchemaNode::File,
            Some("object") => SchemaNode::Object(ObjectShape::from_map(map)),
            // JSON Schema treats a node with members but no type as an object
            None if map.contains_key("properties") || map.contains_key("additionalProperties") => {
                SchemaNode::Object(ObjectShape::from_map(map))
            }
            _ => SchemaNode::Any,
        }
    }

    fn parse_items(map: &Map<String, Value>) -> ArrayItems {
        match map.get("items") {
            Some(Value::Array(items)) => ArrayItems::Tuple {
                items: items.iter().map(SchemaNode::parse).collect(),
                min_items: map
                    .get("minItems")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as usize,
                max_items: map
                    .get("maxItems")
                    .and_then(Value::as_u64)
                    .filter(|max| *max > 0)
                    .map(|max| max as usize),
                additional: match map.get("additionalItems") {
                    Some(v @ Value::Object(_)) => Some(Box::new(SchemaNode::parse(v))),
                    _ => None,
                },
            },
            Some(items) => ArrayItems::List(Box::new(SchemaNode::parse(items))),
            None => ArrayItems::List(Box::new(SchemaNode::Any)),
        }
    }
}

/// Values of `additionalProperties`: schemas are parsed, `true` means any.
pub fn additional_properties(value: Option<&Value>) -> Option<Box<SchemaNode>> {
    match value {
        Some(v @ Value::Object(_)) => Some(Box::new(SchemaNode::parse(v))),
        Some(Value::Bool(true)) => Some(Box::new(SchemaNode::Any)),
        _ => None,
    }
}

/// String entries of a JSON array, ignoring anything else.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Enum members rendered as plain text.
pub fn literal_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(literal_text).collect())
        .unwrap_or_default()
}

/// Text of a literal: strings unquoted, everything else as JSON.
pub fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_wins_over_type() {
        let node = SchemaNode::parse(&json!({"$ref": "#/definitions/Pet", "type": "object"}));
        assert_eq!(node, SchemaNode::Ref("#/definitions/Pet".into()));
    }

    #[test]
    fn falsy_type_override_is_ignored() {
        let string = SchemaNode::String {
            literals: vec![],
            constant: None,
        };
        assert_eq!(
            SchemaNode::parse(&json!({"type": "string", "x-type": false})),
            string
        );
        assert_eq!(
            SchemaNode::parse(&json!({"type": "string", "x-type": 0})),
            string
        );
        assert_eq!(
            SchemaNode::parse(&json!({"type": "string", "x-type": 7})),
            SchemaNode::TypeOverride("7".into())
        );
    }

    #[test]
    fn explicit_null_type() {
        assert_eq!(SchemaNode::parse(&json!({"type": null})), SchemaNode::Null);
        assert_eq!(SchemaNode::parse(&json!({"type": "null"})), SchemaNode::Null);
        assert_eq!(SchemaNode::parse(&Value::Null), SchemaNode::Null);
    }

    #[test]
    fn nullable_wraps_remaining_node() {
        let node = SchemaNode::parse(&json!({"type": "string", "x-nullable": true}));
        assert_eq!(
            node,
            SchemaNode::Nullable(Box::new(SchemaNode::String {
                literals: vec![],
                constant: None
            }))
        );
    }

    #[test]
    fn any_of_requires_missing_type() {
        let node = SchemaNode::parse(&json!({"anyOf": [{"type": "string"}]}));
        assert!(matches!(node, SchemaNode::Union(v) if v.len() == 1));

        let node = SchemaNode::parse(&json!({"type": "string", "anyOf": [{"type": "number"}]}));
        assert!(matches!(node, SchemaNode::String { .. }));
    }

    #[test]
    fn all_of_drops_nullable_branches() {
        let node = SchemaNode::parse(&json!({
            "allOf": [
                {"$ref": "#/definitions/Pet"},
                {"x-nullable": true, "type": "null"}
            ]
        }));
        assert_eq!(
            node,
            SchemaNode::Intersection(vec![SchemaNode::Ref("#/definitions/Pet".into())])
        );
    }

    #[test]
    fn tuple_items_capture_bounds() {
        let node = SchemaNode::parse(&json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "number"}],
            "minItems": 1,
            "maxItems": 2
        }));
        match node {
            SchemaNode::Array(ArrayItems::Tuple {
                items,
                min_items,
                max_items,
                additional,
            }) => {
                assert_eq!(items.len(), 2);
                assert_eq!(min_items, 1);
                assert_eq!(max_items, Some(2));
                assert!(additional.is_none());
            }
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn untyped_node_with_properties_is_object() {
        let node = SchemaNode::parse(&json!({"properties": {"a": {"type": "string"}}}));
        assert!(matches!(node, SchemaNode::Object(shape) if shape.properties.len() == 1));

        assert_eq!(SchemaNode::parse(&json!({})), SchemaNode::Any);
        assert_eq!(SchemaNode::parse(&json!({"type": "uuid"})), SchemaNode::Any);
    }

    #[test]
    fn numeric_literals_render_as_json() {
        let node = SchemaNode::parse(&json!({"type": "integer", "enum": [1, 2]}));
        assert_eq!(
            node,
            SchemaNode::Number {
                literals: vec!["1".into(), "2".into()],
                constant: None
            }
        );
    }
}
