//! Compiled type expressions.

use std::fmt;

use serde::{Serialize, Serializer};

/// A compiled schema type.
///
/// Both shapes render as text and yield dependency names. Compound forms keep
/// an explicit, deduplicated list of constituent type names that is only used
/// for dependency extraction, never for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A printable name: a primitive, a reference, or a literal union.
    Scalar(String),
    /// Unions, intersections, inline records, arrays and tuples.
    Compound { text: String, all_types: Vec<String> },
}

impl TypeExpr {
    pub fn scalar(text: impl Into<String>) -> Self {
        TypeExpr::Scalar(text.into())
    }

    /// Compound whose constituents are merged from `members`.
    pub fn compound(text: impl Into<String>, members: &[TypeExpr]) -> Self {
        TypeExpr::Compound {
            text: text.into(),
            all_types: merge_types(members),
        }
    }

    /// Joins `variants` with `separator`, keeping all their constituents.
    pub fn join(variants: &[TypeExpr], separator: &str) -> Self {
        let text = variants
            .iter()
            .map(TypeExpr::to_string)
            .collect::<Vec<_>>()
            .join(separator);
        TypeExpr::compound(text, variants)
    }

    pub fn null() -> Self {
        TypeExpr::scalar("null")
    }

    pub fn any() -> Self {
        TypeExpr::scalar("any")
    }

    pub fn text(&self) -> &str {
        match self {
            TypeExpr::Scalar(text) => text,
            TypeExpr::Compound { text, .. } => text,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, TypeExpr::Compound { .. })
    }

    /// Constituent names as stored: the explicit list for compounds, the
    /// text itself for scalars.
    pub fn constituents(&self) -> Vec<String> {
        match self {
            TypeExpr::Scalar(text) => vec![text.clone()],
            TypeExpr::Compound { all_types, .. } => all_types.clone(),
        }
    }

    /// Names this type depends on, with array and nullable wrappers removed.
    pub fn dependency_names(&self) -> Vec<String> {
        match self {
            TypeExpr::Scalar(text) => vec![remove_brackets(text)],
            TypeExpr::Compound { all_types, .. } => {
                all_types.iter().map(|t| remove_brackets(t)).collect()
            }
        }
    }

    /// The single name this type stands for, used to look up a backing
    /// model. Compounds with several constituents have none.
    pub fn bare_name(&self) -> Option<String> {
        match self {
            TypeExpr::Scalar(text) => Some(remove_brackets(text)),
            TypeExpr::Compound { all_types, .. } if all_types.len() == 1 => {
                Some(remove_brackets(&all_types[0]))
            }
            TypeExpr::Compound { .. } => None,
        }
    }

    /// Prefixes the rendering with `null | `, keeping constituents.
    pub fn nullable(self) -> Self {
        match self {
            TypeExpr::Scalar(text) => TypeExpr::Scalar(format!("null | {text}")),
            TypeExpr::Compound { text, all_types } => TypeExpr::Compound {
                text: format!("null | {text}"),
                all_types,
            },
        }
    }

    /// Whether the rendering, ignoring a nullable prefix, is an array.
    pub fn is_array(&self) -> bool {
        let text = strip_nullable(self.text());
        text.starts_with("Array<") || text.ends_with("[]")
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for TypeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

/// Deduplicated union of the constituents of every type, in first-seen order.
pub fn merge_types(types: &[TypeExpr]) -> Vec<String> {
    let mut all_types: Vec<String> = Vec::new();
    for ty in types {
        for name in ty.constituents() {
            if !all_types.contains(&name) {
                all_types.push(name);
            }
        }
    }
    all_types
}

/// Removes a leading `null | ` from a rendered type.
pub fn strip_nullable(text: &str) -> &str {
    let mut text = text;
    while let Some(rest) = text
        .strip_prefix("null | ")
        .or_else(|| text.strip_prefix("null|"))
    {
        text = rest;
    }
    text
}

/// Removes nullable and array wrappers from a rendered type name:
/// `Array<Pet>`, `Pet[]` and `null | Pet` all yield `Pet`.
pub fn remove_brackets(text: &str) -> String {
    let compact: String = text.chars().filter(|c| *c != ' ').collect();
    let mut name = compact.as_str();
    loop {
        if let Some(rest) = name.strip_prefix("null|") {
            name = rest;
        } else if let Some(rest) = name.strip_prefix("undefined|") {
            name = rest;
        } else {
            break;
        }
    }
    if let Some(inner) = name
        .strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return inner.to_string();
    }
    match name.find('[') {
        Some(pos) => name[..pos].to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_brackets_strips_wrappers() {
        assert_eq!(remove_brackets("Array<Pet>"), "Pet");
        assert_eq!(remove_brackets("Pet[]"), "Pet");
        assert_eq!(remove_brackets("null | Pet"), "Pet");
        assert_eq!(remove_brackets("null | Array<Pet>"), "Pet");
        assert_eq!(remove_brackets("string"), "string");
    }

    #[test]
    fn merge_types_flattens_and_dedups() {
        let a = TypeExpr::scalar("Pet");
        let b = TypeExpr::Compound {
            text: "Array<Pet>".into(),
            all_types: vec!["Pet".into()],
        };
        let c = TypeExpr::Compound {
            text: "{a: Tag, b: Owner}".into(),
            all_types: vec!["Tag".into(), "Owner".into()],
        };
        assert_eq!(merge_types(&[a, b, c]), vec!["Pet", "Tag", "Owner"]);
    }

    #[test]
    fn join_renders_and_merges() {
        let union = TypeExpr::join(
            &[TypeExpr::scalar("Cat"), TypeExpr::scalar("Dog")],
            " | ",
        );
        assert_eq!(union.to_string(), "Cat | Dog");
        assert_eq!(union.dependency_names(), vec!["Cat", "Dog"]);
    }

    #[test]
    fn bare_name_of_single_constituent_compound() {
        let array = TypeExpr::compound("Array<Pet>", &[TypeExpr::scalar("Pet")]);
        assert_eq!(array.bare_name().as_deref(), Some("Pet"));

        let record = TypeExpr::compound(
            "{a: Tag, b: Owner}",
            &[TypeExpr::scalar("Tag"), TypeExpr::scalar("Owner")],
        );
        assert_eq!(record.bare_name(), None);
    }

    #[test]
    fn nullable_keeps_constituents() {
        let array = TypeExpr::compound("Array<Pet>", &[TypeExpr::scalar("Pet")]).nullable();
        assert_eq!(array.to_string(), "null | Array<Pet>");
        assert_eq!(array.dependency_names(), vec!["Pet"]);
        assert!(array.is_array());
    }

    #[test]
    fn serializes_as_rendered_text() {
        let ty = TypeExpr::compound("Array<Pet>", &[TypeExpr::scalar("Pet")]);
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"Array<Pet>\"");
    }
}
