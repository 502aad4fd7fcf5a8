//! Model building - one descriptor per named definition.
//!
//! Models are built in three passes over the `definitions` map:
//!
//! 1. classify each definition into a [`ModelKind`] and collect its members
//! 2. link hierarchies: parent names are checked against the table and every
//!    parent records its subclasses
//! 3. resolve each model's direct dependencies
//!
//! Models refer to each other by class name through the [`ModelTable`],
//! never by embedded descriptors, so cyclic schemas need no special care.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dependencies::DependencyResolver;
use crate::error::CompileError;
use crate::loader::inline_refs;
use crate::naming::{
    normalize_model_name, property_key, simple_ref, to_class_name, to_comments, to_enum_name,
    to_file_name,
};
use crate::resolver::{property_type, resolve_type};
use crate::schema::{additional_properties, literal_list, string_list, SchemaNode};
use crate::typeexpr::TypeExpr;
use crate::types::CompileOptions;

/// Descriptor of a named schema definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Name as declared under `definitions`.
    pub name: String,
    pub class_name: String,
    pub file_name: String,
    pub example_file: String,
    pub description: Option<String>,
    pub comments: String,
    #[serde(flatten)]
    pub kind: ModelKind,
    /// Class names of the models this one is composed from.
    pub parents: Vec<String>,
    /// Class names of the models composed from this one.
    pub subclasses: Vec<String>,
    /// Class names of the models this one references directly.
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    pub is_last: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ModelKind {
    Object {
        properties: Vec<PropertyDescriptor>,
        additional_properties: Option<TypeExpr>,
    },
    Enum {
        values: Vec<EnumValue>,
    },
    Array {
        element_type: TypeExpr,
    },
    Simple {
        alias: TypeExpr,
    },
    Union {
        alias: TypeExpr,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    /// Name as emitted in a declaration, quoted when not a bare identifier.
    pub key: String,
    pub required: bool,
    pub description: Option<String>,
    pub comments: String,
    #[serde(rename = "type")]
    pub property_type: TypeExpr,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub value: String,
    pub is_last: bool,
}

impl ModelDescriptor {
    pub fn new(name: &str, file_suffix: &str, description: Option<String>, kind: ModelKind) -> Self {
        let class_name = to_class_name(name);
        Self {
            name: name.to_string(),
            file_name: format!("{}{}", to_file_name(&class_name), file_suffix),
            example_file: to_file_name(name),
            comments: to_comments(description.as_deref(), 0),
            class_name,
            description,
            kind,
            parents: Vec::new(),
            subclasses: Vec::new(),
            dependencies: Vec::new(),
            example: None,
            is_last: false,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ModelKind::Object { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, ModelKind::Enum { .. })
    }

    /// Alias type of simple and union models.
    pub fn alias(&self) -> Option<&TypeExpr> {
        match &self.kind {
            ModelKind::Simple { alias } | ModelKind::Union { alias } => Some(alias),
            _ => None,
        }
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        match &self.kind {
            ModelKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Enums and scalar aliases cannot reference other models.
    fn can_have_dependencies(&self) -> bool {
        match &self.kind {
            ModelKind::Enum { .. } => false,
            ModelKind::Simple { alias } => alias.is_compound(),
            _ => true,
        }
    }
}

/// Models keyed by normalized definition name.
///
/// Lookups also accept a model's class name, so `the-user` and `TheUser`
/// find the same descriptor.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ModelTable {
    models: IndexMap<String, ModelDescriptor>,
    #[serde(skip)]
    aliases: HashMap<String, String>,
}

impl ModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `model`, returning its key. A model with the same normalized
    /// name is replaced.
    pub fn insert(&mut self, model: ModelDescriptor) -> String {
        let key = normalize_model_name(&model.name);
        let alias = normalize_model_name(&model.class_name);
        if alias != key {
            self.aliases.insert(alias, key.clone());
        }
        self.models.insert(key.clone(), model);
        key
    }

    /// Table key for a definition name or class name.
    pub fn key_of(&self, name: &str) -> Option<&str> {
        let normalized = normalize_model_name(name);
        if let Some((key, _)) = self.models.get_key_value(&normalized) {
            return Some(key.as_str());
        }
        self.aliases
            .get(&normalized)
            .filter(|key| self.models.contains_key(*key))
            .map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        let key = self.key_of(name)?;
        self.models.get(key)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelDescriptor> {
        let key = self.key_of(name)?.to_string();
        self.models.get_mut(&key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.key_of(name).is_some()
    }

    /// Removes a model, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<ModelDescriptor> {
        let key = self.key_of(name)?.to_string();
        self.aliases.retain(|_, target| *target != key);
        self.models.shift_remove(&key)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.models.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelDescriptor)> {
        self.models.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ModelDescriptor> {
        self.models.values_mut()
    }
}

/// Build the model table from the document's `definitions`.
///
/// # Errors
///
/// Returns `CompileError::UnresolvedParent` if a composition names a parent
/// that is not a known model, and `CompileError::InvalidDocument` if
/// `definitions` is not an object.
pub fn build_models(document: &Value, options: &CompileOptions) -> Result<ModelTable, CompileError> {
    let mut table = ModelTable::new();
    let definitions = match document.get("definitions") {
        None | Some(Value::Null) => return Ok(table),
        Some(Value::Object(defs)) => defs,
        Some(_) => {
            return Err(CompileError::InvalidDocument {
                message: "definitions must be an object".to_string(),
            })
        }
    };

    for (name, definition) in definitions {
        let mut model = build_model(name, definition, options);
        if options.generate_examples {
            if let Some(example) = definition.get("example") {
                model.example = Some(inline_refs(example, document)?);
            }
        }
        table.insert(model);
    }

    link_hierarchy(&mut table)?;
    resolve_model_dependencies(&mut table);

    debug!(models = table.len(), "Built model table.");
    Ok(table)
}

fn build_model(name: &str, definition: &Value, options: &CompileOptions) -> ModelDescriptor {
    let empty = Map::new();
    let map = definition.as_object().unwrap_or(&empty);
    let description = map
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    let mut parents = Vec::new();
    let kind = match map.get("allOf") {
        Some(Value::Array(branches)) if !branches.is_empty() => {
            classify_composition(map, branches, &mut parents)
        }
        _ => classify(map, definition),
    };

    let mut model = ModelDescriptor::new(name, &options.custom_file_suffix.model, description, kind);
    model.example_file.push_str(&options.custom_file_suffix.example);
    model.parents = parents;
    model
}

fn classify_composition(
    map: &Map<String, Value>,
    branches: &[Value],
    parents: &mut Vec<String>,
) -> ModelKind {
    let mut properties: Vec<(&String, &Value)> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    let mut additional = None;

    for branch in branches {
        if let Some(reference) = branch.get("$ref").and_then(Value::as_str) {
            parents.push(simple_ref(reference));
            continue;
        }
        let Some(branch) = branch.as_object() else {
            continue;
        };
        if let Some(props) = branch.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                if !properties.iter().any(|(n, _)| *n == name) {
                    properties.push((name, prop));
                }
            }
        }
        for name in string_list(branch.get("required")) {
            if !required.contains(&name) {
                required.push(name);
            }
        }
        if additional.is_none() {
            additional = additional_properties(branch.get("additionalProperties"));
        }
    }

    let enum_values = literal_list(map.get("enum"));
    if parents.is_empty() && !enum_values.is_empty() {
        return enum_kind(&enum_values);
    }
    if parents.is_empty() && properties.is_empty() {
        return ModelKind::Simple {
            alias: TypeExpr::scalar("string"),
        };
    }
    ModelKind::Object {
        properties: build_properties(properties, &required),
        additional_properties: additional.map(|node| resolve_type(&node)),
    }
}

fn classify(map: &Map<String, Value>, definition: &Value) -> ModelKind {
    let ty = map.get("type");
    if ty.and_then(Value::as_str) == Some("array") {
        return ModelKind::Array {
            element_type: property_type(definition),
        };
    }
    if ty.is_none() {
        if let Some(Value::Array(variants)) = map.get("anyOf").or_else(|| map.get("oneOf")) {
            let variants: Vec<TypeExpr> = variants.iter().map(property_type).collect();
            return ModelKind::Union {
                alias: TypeExpr::join(&variants, " |\n  "),
            };
        }
    }
    // Untyped definitions default to objects
    if ty.is_none() || ty.and_then(Value::as_str) == Some("object") {
        let properties: Vec<(&String, &Value)> = map
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.iter().collect())
            .unwrap_or_default();
        return ModelKind::Object {
            properties: build_properties(properties, &string_list(map.get("required"))),
            additional_properties: additional_properties(map.get("additionalProperties"))
                .map(|node| resolve_type(&node)),
        };
    }
    ModelKind::Simple {
        alias: property_type(definition),
    }
}

fn enum_kind(values: &[String]) -> ModelKind {
    let last = values.len().saturating_sub(1);
    ModelKind::Enum {
        values: values
            .iter()
            .enumerate()
            .map(|(i, value)| EnumValue {
                name: to_enum_name(value),
                value: value.replace('\'', "\\'"),
                is_last: i == last,
            })
            .collect(),
    }
}

/// Property descriptors sorted by name, the last one flagged.
fn build_properties(properties: Vec<(&String, &Value)>, required: &[String]) -> Vec<PropertyDescriptor> {
    let mut result: Vec<PropertyDescriptor> = properties
        .into_iter()
        .map(|(name, prop)| {
            let description = prop
                .get("description")
                .and_then(Value::as_str)
                .map(String::from);
            PropertyDescriptor {
                key: property_key(name),
                required: required.contains(name),
                comments: to_comments(description.as_deref(), 1),
                description,
                property_type: resolve_type(&SchemaNode::parse(prop)),
                name: name.clone(),
                is_last: false,
            }
        })
        .collect();
    result.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(last) = result.last_mut() {
        last.is_last = true;
    }
    result
}

/// Replaces parent names with canonical class names and records subclasses.
fn link_hierarchy(table: &mut ModelTable) -> Result<(), CompileError> {
    let mut links: Vec<(String, Vec<String>)> = Vec::new();
    for (key, model) in table.iter() {
        if !model.is_object() || model.parents.is_empty() {
            continue;
        }
        let mut parents: Vec<String> = Vec::new();
        for parent in &model.parents {
            let parent_model = table
                .get(parent)
                .ok_or_else(|| CompileError::UnresolvedParent {
                    model: model.name.clone(),
                    parent: parent.clone(),
                })?;
            if !parents.contains(&parent_model.class_name) {
                parents.push(parent_model.class_name.clone());
            }
        }
        links.push((key.clone(), parents));
    }

    for (key, parents) in links {
        let Some(child) = table.get_mut(&key) else {
            continue;
        };
        child.parents = parents.clone();
        let child_class = child.class_name.clone();
        for parent in parents {
            if let Some(parent_model) = table.get_mut(&parent) {
                if !parent_model.subclasses.contains(&child_class) {
                    parent_model.subclasses.push(child_class.clone());
                }
            }
        }
    }
    Ok(())
}

fn resolve_model_dependencies(table: &mut ModelTable) {
    let mut resolved: Vec<(String, Vec<String>)> = Vec::new();
    for (key, model) in table.iter() {
        if !model.can_have_dependencies() {
            continue;
        }
        let mut dependencies = DependencyResolver::new(table, Some(key.as_str()));
        for parent in &model.parents {
            dependencies.add_name(parent);
        }
        match &model.kind {
            ModelKind::Object {
                properties,
                additional_properties,
            } => {
                for property in properties {
                    dependencies.add(&property.property_type);
                }
                if let Some(additional) = additional_properties {
                    dependencies.add(additional);
                }
            }
            ModelKind::Array { element_type } => dependencies.add(element_type),
            ModelKind::Simple { alias } | ModelKind::Union { alias } => dependencies.add(alias),
            ModelKind::Enum { .. } => {}
        }
        resolved.push((key.clone(), dependencies.into_dependencies()));
    }

    for (key, dependencies) in resolved {
        if let Some(model) = table.get_mut(&key) {
            model.dependencies = dependencies;
        }
    }
}
