//! Compiler configuration.

use serde::{Deserialize, Deserializer, Serialize};

/// Ordering of parameters within each required/optional group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortParams {
    Asc,
    #[default]
    Desc,
    /// Keep declaration order.
    None,
}

impl SortParams {
    /// Parse a sort policy. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(SortParams::Asc),
            "desc" => Some(SortParams::Desc),
            "none" => Some(SortParams::None),
            _ => None,
        }
    }
}

/// Suffixes appended to generated file stems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSuffixes {
    pub model: String,
    pub service: String,
    pub example: String,
}

impl Default for FileSuffixes {
    fn default() -> Self {
        Self {
            model: String::new(),
            service: ".service".to_string(),
            example: ".example".to_string(),
        }
    }
}

/// Options for compiling a document.
///
/// Deserializes from the camelCase JSON configuration file; every key is
/// optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Only services with these tags are kept. Accepts a list or a
    /// comma-separated string; empty means all.
    #[serde(deserialize_with = "deserialize_tags")]
    pub include_tags: Option<Vec<String>>,
    /// Services with these tags are dropped. Same forms as `include_tags`.
    #[serde(deserialize_with = "deserialize_tags")]
    pub exclude_tags: Option<Vec<String>>,
    /// Drop models no surviving service reaches.
    pub ignore_unused_models: bool,
    /// Parameter count at which an operation gets a parameters container.
    pub min_params_for_container: usize,
    pub sort_params: SortParams,
    /// Tag for operations that declare none.
    pub default_tag: String,
    /// Lower-case the first letter of operation names.
    pub camel_case: bool,
    pub prefix: String,
    pub custom_file_suffix: FileSuffixes,
    /// Attach each model's `example` with references inlined.
    pub generate_examples: bool,
    pub enum_module: bool,
    pub error_handler: bool,
    pub api_module: bool,
    pub model_index: bool,
    pub service_index: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_tags: None,
            exclude_tags: None,
            ignore_unused_models: true,
            min_params_for_container: 2,
            sort_params: SortParams::Desc,
            default_tag: "Api".to_string(),
            camel_case: false,
            prefix: "Api".to_string(),
            custom_file_suffix: FileSuffixes::default(),
            generate_examples: false,
            enum_module: true,
            error_handler: true,
            api_module: true,
            model_index: true,
            service_index: true,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only services with the given tags.
    pub fn include_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tags = non_empty(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Drop services with the given tags.
    pub fn exclude_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tags = non_empty(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore_unused_models(mut self, ignore: bool) -> Self {
        self.ignore_unused_models = ignore;
        self
    }

    pub fn min_params_for_container(mut self, min: usize) -> Self {
        self.min_params_for_container = min;
        self
    }

    pub fn sort_params(mut self, sort: SortParams) -> Self {
        self.sort_params = sort;
        self
    }

    pub fn default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn camel_case(mut self, camel_case: bool) -> Self {
        self.camel_case = camel_case;
        self
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(tags: Vec<String>) -> Option<Vec<String>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        None => None,
        Some(Tags::Csv(csv)) => non_empty(split_tags(&csv)),
        Some(Tags::List(list)) => non_empty(list),
    })
}
