//! Type resolution - turns schema nodes into [`TypeExpr`]s.

use serde_json::Value;

use crate::naming::simple_ref;
use crate::schema::{ArrayItems, ObjectShape, SchemaNode};
use crate::typeexpr::TypeExpr;

/// Rendering of a Swagger `file`.
pub const BLOB_TYPE: &str = "Blob";

/// Resolve a raw schema value.
pub fn property_type(value: &Value) -> TypeExpr {
    resolve_type(&SchemaNode::parse(value))
}

/// Resolve a parsed schema node.
///
/// Pure: references are rendered by name and never followed, so the result
/// depends only on `node`.
pub fn resolve_type(node: &SchemaNode) -> TypeExpr {
    match node {
        SchemaNode::Null => TypeExpr::null(),
        SchemaNode::Ref(reference) => TypeExpr::scalar(simple_ref(reference)),
        SchemaNode::TypeOverride(text) => {
            if text.is_empty() {
                TypeExpr::null()
            } else {
                TypeExpr::scalar(text.replace("List<", "Array<"))
            }
        }
        SchemaNode::Nullable(inner) => resolve_type(inner).nullable(),
        SchemaNode::Union(variants) | SchemaNode::MultiType(variants) => {
            TypeExpr::join(&resolve_all(variants), " | ")
        }
        SchemaNode::Intersection(branches) => TypeExpr::join(&resolve_all(branches), " & "),
        SchemaNode::String { literals, constant } => {
            if !literals.is_empty() {
                let quoted: Vec<String> = literals.iter().map(|l| quote_literal(l)).collect();
                TypeExpr::scalar(quoted.join(" | "))
            } else if let Some(constant) = constant {
                TypeExpr::scalar(quote_literal(constant))
            } else {
                TypeExpr::scalar("string")
            }
        }
        SchemaNode::Number { literals, constant } => {
            if !literals.is_empty() {
                TypeExpr::scalar(literals.join(" | "))
            } else if let Some(constant) = constant {
                TypeExpr::scalar(constant.clone())
            } else {
                TypeExpr::scalar("number")
            }
        }
        SchemaNode::Boolean => TypeExpr::scalar("boolean"),
        SchemaNode::File => TypeExpr::scalar(BLOB_TYPE),
        SchemaNode::Array(items) => resolve_array(items),
        SchemaNode::Object(shape) => resolve_record(shape),
        SchemaNode::Any => TypeExpr::any(),
    }
}

fn resolve_all(nodes: &[SchemaNode]) -> Vec<TypeExpr> {
    nodes.iter().map(resolve_type).collect()
}

fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal)
}

fn resolve_array(items: &ArrayItems) -> TypeExpr {
    match items {
        ArrayItems::List(item) => {
            let item = resolve_type(item);
            TypeExpr::compound(format!("Array<{item}>"), std::slice::from_ref(&item))
        }
        ArrayItems::Tuple {
            items,
            min_items,
            max_items,
            additional,
        } => {
            // An unbounded tuple has no fixed-length rendering
            let Some(max_items) = *max_items else {
                return TypeExpr::scalar("Array<any>");
            };
            let mut types = resolve_all(items);
            types.push(match additional {
                Some(extra) => resolve_type(extra),
                None => TypeExpr::any(),
            });

            // Lengths past `types.len()` render like `types.len()` itself
            let longest = max_items.min(types.len());
            if *min_items > longest {
                return TypeExpr::scalar("Array<any>");
            }
            let variants: Vec<String> = (*min_items..=longest)
                .map(|len| {
                    let members: Vec<String> = types
                        .iter()
                        .take(len)
                        .map(TypeExpr::to_string)
                        .collect();
                    format!("[{}]", members.join(", "))
                })
                .collect();
            let bounded = &types[..longest];
            TypeExpr::compound(variants.join(" | "), bounded)
        }
    }
}

fn resolve_record(shape: &ObjectShape) -> TypeExpr {
    let mut members = Vec::new();
    let mut types = Vec::new();
    for (name, prop) in &shape.properties {
        let ty = resolve_type(prop);
        let marker = if shape.is_required(name) { ": " } else { "?: " };
        members.push(format!("{name}{marker}{ty}"));
        types.push(ty);
    }
    if let Some(additional) = &shape.additional {
        let ty = resolve_type(additional);
        members.push(format!("[key: string]: {ty}"));
        types.push(ty);
    }
    TypeExpr::compound(format!("{{{}}}", members.join(", ")), &types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: Value) -> String {
        property_type(&value).to_string()
    }

    #[test]
    fn primitives() {
        assert_eq!(render(json!({"type": "string"})), "string");
        assert_eq!(render(json!({"type": "integer"})), "number");
        assert_eq!(render(json!({"type": "number"})), "number");
        assert_eq!(render(json!({"type": "boolean"})), "boolean");
        assert_eq!(render(json!({"type": "file"})), "Blob");
        assert_eq!(render(json!({"type": "mystery"})), "any");
        assert_eq!(render(Value::Null), "null");
    }

    #[test]
    fn reference_uses_simple_class_name() {
        assert_eq!(render(json!({"$ref": "#/definitions/pet-owner"})), "PetOwner");
    }

    #[test]
    fn type_override() {
        assert_eq!(render(json!({"x-type": "List<Pet>"})), "Array<Pet>");
        assert_eq!(render(json!({"x-type": ""})), "null");
        assert_eq!(render(json!({"type": "string", "x-type": false})), "string");
        assert_eq!(render(json!({"type": "string", "x-type": 0})), "string");
    }

    #[test]
    fn nullable_prefix() {
        assert_eq!(
            render(json!({"$ref": "#/definitions/Pet", "x-nullable": true})),
            "Pet"
        );
        assert_eq!(
            render(json!({"type": "string", "x-nullable": true})),
            "null | string"
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            render(json!({"type": "string", "enum": ["a", "b"]})),
            "'a' | 'b'"
        );
        assert_eq!(render(json!({"type": "string", "const": "x"})), "'x'");
        assert_eq!(render(json!({"type": "integer", "enum": [1, 2]})), "1 | 2");
        assert_eq!(render(json!({"type": "number", "const": 0})), "0");
    }

    #[test]
    fn union_flattens_constituents() {
        let ty = property_type(&json!({
            "oneOf": [
                {"$ref": "#/definitions/Cat"},
                {"type": "array", "items": {"$ref": "#/definitions/Dog"}},
                {"$ref": "#/definitions/Cat"}
            ]
        }));
        assert_eq!(ty.to_string(), "Cat | Array<Dog> | Cat");
        assert_eq!(ty.constituents(), vec!["Cat", "Dog"]);
    }

    #[test]
    fn intersection_skips_nullable_branches() {
        let ty = property_type(&json!({
            "allOf": [
                {"$ref": "#/definitions/Base"},
                {"$ref": "#/definitions/Extra"},
                {"x-nullable": true}
            ]
        }));
        assert_eq!(ty.to_string(), "Base & Extra");
        assert_eq!(ty.constituents(), vec!["Base", "Extra"]);
    }

    #[test]
    fn multi_type_union() {
        let ty = property_type(&json!({"type": ["string", "null"]}));
        assert_eq!(ty.to_string(), "string | null");
        assert!(ty.is_compound());
    }

    #[test]
    fn array_of_reference() {
        let ty = property_type(&json!({"type": "array", "items": {"$ref": "#/definitions/Pet"}}));
        assert_eq!(ty.to_string(), "Array<Pet>");
        assert_eq!(ty.constituents(), vec!["Pet"]);
    }

    #[test]
    fn tuple_ranges_over_valid_lengths() {
        let ty = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}, {"$ref": "#/definitions/Pet"}],
            "minItems": 1,
            "maxItems": 2
        }));
        assert_eq!(ty.to_string(), "[string] | [string, Pet]");
        assert_eq!(ty.constituents(), vec!["string", "Pet"]);
    }

    #[test]
    fn tuple_lengths_stop_at_declared_items() {
        let ty = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}],
            "maxItems": 4
        }));
        assert_eq!(ty.to_string(), "[] | [string] | [string, any]");
        assert_eq!(ty.constituents(), vec!["string", "any"]);

        let huge = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}],
            "minItems": 1,
            "maxItems": 1_000_000_000u64
        }));
        assert_eq!(huge.to_string(), "[string] | [string, any]");
    }

    #[test]
    fn tuple_with_inverted_bounds_is_any_array() {
        let ty = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}],
            "minItems": 3,
            "maxItems": 1
        }));
        assert_eq!(ty, TypeExpr::scalar("Array<any>"));

        // More required items than can be rendered
        let ty = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}],
            "minItems": 5,
            "maxItems": 9
        }));
        assert_eq!(ty, TypeExpr::scalar("Array<any>"));
    }

    #[test]
    fn tuple_without_max_items_is_any_array() {
        let ty = property_type(&json!({
            "type": "array",
            "items": [{"type": "string"}]
        }));
        assert_eq!(ty, TypeExpr::scalar("Array<any>"));
    }

    #[test]
    fn inline_record() {
        let ty = property_type(&json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "integer"},
                "owner": {"$ref": "#/definitions/Owner"}
            },
            "additionalProperties": {"$ref": "#/definitions/Tag"}
        }));
        assert_eq!(
            ty.to_string(),
            "{id: number, owner?: Owner, [key: string]: Tag}"
        );
        assert_eq!(ty.constituents(), vec!["number", "Owner", "Tag"]);
    }

    #[test]
    fn sibling_branches_render_independently() {
        let a = property_type(&json!({"anyOf": [{"$ref": "#/definitions/A"}, {"type": "string"}]}));
        let b = property_type(&json!({"anyOf": [{"$ref": "#/definitions/A"}, {"type": "object"}]}));
        assert!(a.to_string().starts_with("A | "));
        assert!(b.to_string().starts_with("A | "));
    }
}
