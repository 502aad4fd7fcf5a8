//! Dependency accumulation against the model table.

use crate::model::ModelTable;
use crate::typeexpr::{remove_brackets, TypeExpr};

/// Collects the models a type (or a set of types) depends on.
///
/// Names without a backing model, such as primitives, are skipped silently.
/// The result keeps first-seen order and never contains the owner itself.
pub struct DependencyResolver<'a> {
    models: &'a ModelTable,
    owner: Option<String>,
    dependencies: Vec<String>,
}

impl<'a> DependencyResolver<'a> {
    /// `owner` is the model the dependencies belong to, if any; services
    /// have none.
    pub fn new(models: &'a ModelTable, owner: Option<&str>) -> Self {
        Self {
            models,
            owner: owner.and_then(|name| models.key_of(name)).map(String::from),
            dependencies: Vec::new(),
        }
    }

    /// Adds every constituent of `ty`.
    pub fn add(&mut self, ty: &TypeExpr) {
        for name in ty.dependency_names() {
            self.add_name(&name);
        }
    }

    /// Adds a single candidate name, stripping array and nullable wrappers.
    pub fn add_name(&mut self, name: &str) {
        let bare = remove_brackets(name);
        let Some(key) = self.models.key_of(&bare) else {
            return;
        };
        if self.owner.as_deref() == Some(key) {
            return;
        }
        let Some(model) = self.models.get(key) else {
            return;
        };
        if !self.dependencies.contains(&model.class_name) {
            self.dependencies.push(model.class_name.clone());
        }
    }

    pub fn get(&self) -> &[String] {
        &self.dependencies
    }

    pub fn into_dependencies(self) -> Vec<String> {
        self.dependencies
    }
}
