//! Tag filtering and unused-model pruning.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::ModelTable;
use crate::naming::tag_name;
use crate::operation::ServiceTable;
use crate::types::CompileOptions;

/// Drops services by tag, then, when configured, every model no surviving
/// service reaches.
///
/// Models used only by error responses count as reached.
#[derive(Debug, Clone)]
pub struct TagFilter {
    include: Option<HashSet<String>>,
    exclude: Option<HashSet<String>>,
    ignore_unused_models: bool,
}

impl TagFilter {
    pub fn new(options: &CompileOptions) -> Self {
        let normalize = |tags: &Option<Vec<String>>| {
            tags.as_ref()
                .map(|tags| {
                    tags.iter()
                        .map(|t| tag_name(Some(t), &options.default_tag))
                        .collect::<HashSet<_>>()
                })
                .filter(|tags| !tags.is_empty())
        };
        Self {
            include: normalize(&options.include_tags),
            exclude: normalize(&options.exclude_tags),
            ignore_unused_models: options.ignore_unused_models,
        }
    }

    /// Whether a service with this normalized tag survives.
    pub fn keeps(&self, tag: &str) -> bool {
        self.include.as_ref().map_or(true, |include| include.contains(tag))
            && self.exclude.as_ref().map_or(true, |exclude| !exclude.contains(tag))
    }

    pub fn apply(&self, models: &mut ModelTable, services: &mut ServiceTable) {
        services.retain(|tag, _| {
            let keep = self.keeps(tag);
            if !keep {
                info!(service = %tag, "Ignoring service by tag.");
            }
            keep
        });

        if !self.ignore_unused_models {
            return;
        }

        let seeds = services
            .values()
            .flat_map(|s| s.dependencies.iter().chain(&s.error_dependencies))
            .cloned();
        let used = collect_dependencies(models, seeds);

        let unused: Vec<String> = models
            .values()
            .filter(|m| !used.contains(&m.class_name))
            .map(|m| m.name.clone())
            .collect();
        for name in unused {
            info!(model = %name, "Ignoring unused model.");
            models.remove(&name);
        }
        debug!(models = models.len(), services = services.len(), "Filtered tables.");
    }
}

/// Class names of `seeds` and every model they reach through model
/// dependencies. Seeds without a model are kept as given.
pub fn collect_dependencies<I>(models: &ModelTable, seeds: I) -> HashSet<String>
where
    I: IntoIterator<Item = String>,
{
    let mut visited = HashSet::new();
    let mut stack: Vec<String> = seeds.into_iter().collect();
    while let Some(name) = stack.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some(model) = models.get(&name) {
            for dependency in &model.dependencies {
                if !visited.contains(dependency) {
                    stack.push(dependency.clone());
                }
            }
        }
    }
    visited
}
