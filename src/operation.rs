//! Operation building - services, operations and parameters from `paths`.
//!
//! Every operation lands in exactly one service, named after its first tag.
//! Once all operations are known, each service resolves its success and
//! error dependencies separately so they can be pruned independently.

use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::dependencies::DependencyResolver;
use crate::error::CompileError;
use crate::loader::resolve_local_ref;
use crate::model::ModelTable;
use crate::naming::{
    capitalize_first, tag_name, to_class_name, to_comments, to_file_name, to_identifier,
    uncapitalize_first,
};
use crate::resolver::{property_type, BLOB_TYPE};
use crate::typeexpr::{strip_nullable, TypeExpr};
use crate::types::{CompileOptions, SortParams};

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("path parameter regex is valid"));

/// Services keyed by normalized tag.
pub type ServiceTable = IndexMap<String, ServiceDescriptor>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    /// Parse a path item key. Returns `None` for keys that are not methods
    /// (`parameters`, vendor extensions).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "body" => Some(ParamLocation::Body),
            "formData" => Some(ParamLocation::FormData),
            _ => None,
        }
    }
}

/// Shape of an operation's result, cross-referenced with the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultKind {
    Void,
    String,
    Number,
    Boolean,
    Enum,
    Object,
    PrimitiveArray,
    File,
    Unknown,
}

/// How a response body should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Blob,
    Text,
    Json,
}

impl ResultKind {
    pub fn response_type(self) -> ResponseType {
        match self {
            ResultKind::File => ResponseType::Blob,
            ResultKind::Void
            | ResultKind::String
            | ResultKind::Number
            | ResultKind::Boolean
            | ResultKind::Enum => ResponseType::Text,
            ResultKind::Object | ResultKind::PrimitiveArray | ResultKind::Unknown => {
                ResponseType::Json
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Normalized tag.
    pub name: String,
    pub class_name: String,
    pub file_name: String,
    pub description: Option<String>,
    pub comments: String,
    pub operations: Vec<OperationDescriptor>,
    /// Models used by parameters and 2xx responses.
    pub dependencies: Vec<String>,
    /// Models used by responses outside 2xx.
    pub error_dependencies: Vec<String>,
    pub is_last: bool,
    #[serde(skip)]
    operation_ids: HashSet<String>,
}

impl ServiceDescriptor {
    pub fn new(tag: &str, options: &CompileOptions) -> Self {
        let class = to_class_name(tag);
        Self {
            name: tag.to_string(),
            class_name: format!("{class}Service"),
            file_name: format!(
                "{}{}",
                to_file_name(&class),
                options.custom_file_suffix.service
            ),
            description: None,
            comments: String::new(),
            operations: Vec::new(),
            dependencies: Vec::new(),
            error_dependencies: Vec::new(),
            is_last: false,
            operation_ids: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// Identifier, unique within the service.
    pub id: String,
    /// Method name as emitted; `id`, camel-cased when configured.
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub path_expression: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// Name of the synthesized parameters container, when there is one.
    pub params_class: Option<String>,
    pub params_class_comments: Option<String>,
    pub responses: IndexMap<String, ResponseDescriptor>,
    pub result_type: TypeExpr,
    pub result_description: Option<String>,
    pub result_kind: ResultKind,
    pub response_type: ResponseType,
    pub returns_headers: bool,
    pub is_multipart: bool,
    pub doc: String,
    pub comments: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    pub var: String,
    /// `var`, scoped to the container when there is one.
    pub full_var: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub param_type: TypeExpr,
    pub description: Option<String>,
    pub comments: String,
    pub collection_format: Option<String>,
    pub is_array: bool,
    /// Form values that must be JSON-encoded before sending.
    pub to_json: bool,
    pub is_last: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescriptor {
    pub code: String,
    #[serde(rename = "type")]
    pub response_type: TypeExpr,
}

/// Build the service table from the document's `paths`.
///
/// # Errors
///
/// Returns `CompileError::UnresolvedReference` if a parameter or response
/// `$ref` does not resolve, and `CompileError::InvalidDocument` if `paths`
/// is not an object.
pub fn build_services(
    document: &Value,
    models: &ModelTable,
    options: &CompileOptions,
) -> Result<ServiceTable, CompileError> {
    let mut services = ServiceTable::new();
    let paths = match document.get("paths") {
        None | Some(Value::Null) => return Ok(services),
        Some(Value::Object(paths)) => paths,
        Some(_) => {
            return Err(CompileError::InvalidDocument {
                message: "paths must be an object".to_string(),
            })
        }
    };

    for (url, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (key, definition) in item {
            let Some(method) = HttpMethod::parse(key) else {
                continue;
            };
            let Some(definition) = definition.as_object() else {
                continue;
            };
            let first_tag = definition
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|tags| tags.first())
                .and_then(Value::as_str);
            let tag = tag_name(first_tag, &options.default_tag);
            let service = services
                .entry(tag.clone())
                .or_insert_with(|| ServiceDescriptor::new(&tag, options));

            let endpoint = Endpoint {
                url,
                method,
                item,
                definition,
            };
            let operation = build_operation(document, models, options, &endpoint, service)?;
            service.operations.push(operation);
        }
    }

    attach_tag_descriptions(document, &mut services, options);
    for service in services.values_mut() {
        resolve_service_dependencies(service, models);
    }

    debug!(services = services.len(), "Built service table.");
    Ok(services)
}

/// One method of one path item.
struct Endpoint<'a> {
    url: &'a str,
    method: HttpMethod,
    item: &'a Map<String, Value>,
    definition: &'a Map<String, Value>,
}

fn build_operation(
    document: &Value,
    models: &ModelTable,
    options: &CompileOptions,
    endpoint: &Endpoint<'_>,
    service: &mut ServiceDescriptor,
) -> Result<OperationDescriptor, CompileError> {
    let definition = endpoint.definition;
    let id = operation_id(
        definition.get("operationId").and_then(Value::as_str),
        endpoint.method,
        endpoint.url,
        &mut service.operation_ids,
    );

    let raw_parameters = merge_parameters(document, endpoint)?;
    let params_class = if raw_parameters.len() >= options.min_params_for_container {
        Some(format!("{}Params", capitalize_first(&id)))
    } else {
        None
    };

    let mut parameters: Vec<ParameterDescriptor> = raw_parameters
        .into_iter()
        .filter_map(|param| build_parameter(param, params_class.is_some(), endpoint))
        .collect();
    sort_parameters(&mut parameters, options.sort_params);

    let responses = build_responses(document, definition)?;
    let result_kind = classify_result(&responses.result_type, models);

    let doc = operation_doc(
        definition,
        endpoint.item,
        &parameters,
        params_class.as_deref(),
        &service.class_name,
        responses.result_description.as_deref(),
    );

    Ok(OperationDescriptor {
        name: if options.camel_case {
            uncapitalize_first(&id)
        } else {
            id.clone()
        },
        method: endpoint.method,
        path: endpoint.url.to_string(),
        path_expression: path_expression(endpoint.url, &parameters, params_class.is_some()),
        params_class_comments: params_class
            .as_ref()
            .map(|_| to_comments(Some(&format!("Parameters for {id}")), 1)),
        params_class,
        is_multipart: parameters
            .iter()
            .any(|p| p.location == ParamLocation::FormData),
        parameters,
        responses: responses.by_code,
        result_type: responses.result_type,
        result_description: responses.result_description,
        result_kind,
        response_type: result_kind.response_type(),
        returns_headers: responses.returns_headers,
        comments: to_comments(Some(&doc), 1),
        doc,
        id,
    })
}

/// Declared or synthesized operation id, made unique against `known`.
pub fn operation_id(
    given: Option<&str>,
    method: HttpMethod,
    url: &str,
    known: &mut HashSet<String>,
) -> String {
    let base = match given {
        Some(given) => to_identifier(given),
        None => to_identifier(&format!("{}{}", method.as_str(), url)),
    };

    let duplicated = known.contains(&base);
    let id = if duplicated {
        let mut i = 1;
        while known.contains(&format!("{base}_{i}")) {
            i += 1;
        }
        format!("{base}_{i}")
    } else {
        base
    };

    match given {
        None => warn!(
            method = method.as_str(),
            path = url,
            operation_id = %id,
            "Operation defines no operationId, synthesized one."
        ),
        Some(given) if duplicated => warn!(
            method = method.as_str(),
            path = url,
            given,
            operation_id = %id,
            "Operation defines a duplicated operationId, renamed."
        ),
        Some(_) => {}
    }

    known.insert(id.clone());
    id
}

/// Operation-level parameters followed by the path item's shared ones, with
/// references resolved. Both lists are kept whole, so a redeclared shared
/// parameter appears twice.
fn merge_parameters<'a>(
    document: &'a Value,
    endpoint: &Endpoint<'a>,
) -> Result<Vec<&'a Value>, CompileError> {
    parameter_list(endpoint.definition)
        .iter()
        .chain(parameter_list(endpoint.item))
        .map(|param| deref(document, param))
        .collect()
}

fn parameter_list(map: &Map<String, Value>) -> &[Value] {
    map.get("parameters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn deref<'a>(document: &'a Value, value: &'a Value) -> Result<&'a Value, CompileError> {
    match value.get("$ref").and_then(Value::as_str) {
        Some(reference) => resolve_local_ref(document, reference),
        None => Ok(value),
    }
}

fn build_parameter(
    param: &Value,
    in_container: bool,
    endpoint: &Endpoint<'_>,
) -> Option<ParameterDescriptor> {
    let name = param.get("name").and_then(Value::as_str).unwrap_or_default();
    let location = param.get("in").and_then(Value::as_str).unwrap_or_default();
    let Some(location) = ParamLocation::parse(location) else {
        warn!(
            method = endpoint.method.as_str(),
            path = endpoint.url,
            parameter = name,
            location,
            "Skipping parameter with unknown location."
        );
        return None;
    };

    let param_type = match param.get("schema") {
        Some(schema) => property_type(schema),
        None => property_type(param),
    };
    let bare_type = strip_nullable(param_type.text());
    let var = to_identifier(name);
    let description = param
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    Some(ParameterDescriptor {
        name: name.to_string(),
        location,
        full_var: if in_container {
            format!("params.{var}")
        } else {
            var.clone()
        },
        var,
        required: param.get("required") == Some(&Value::Bool(true))
            || location == ParamLocation::Path,
        is_array: param.get("type").and_then(Value::as_str) == Some("array"),
        to_json: location == ParamLocation::FormData
            && param.get("enum").is_none()
            && bare_type != BLOB_TYPE
            && bare_type != "string",
        comments: to_comments(description.as_deref(), 2),
        description,
        collection_format: param
            .get("collectionFormat")
            .and_then(Value::as_str)
            .map(String::from),
        param_type,
        is_last: false,
    })
}

/// Required parameters first, then by name according to `sort`.
fn sort_parameters(parameters: &mut [ParameterDescriptor], sort: SortParams) {
    parameters.sort_by(|a, b| {
        b.required.cmp(&a.required).then_with(|| match sort {
            SortParams::Asc => a.name.cmp(&b.name),
            SortParams::Desc => b.name.cmp(&a.name),
            SortParams::None => std::cmp::Ordering::Equal,
        })
    });
    for param in parameters.iter_mut() {
        param.is_last = false;
    }
    if let Some(last) = parameters.last_mut() {
        last.is_last = true;
    }
}

/// Replaces every `{name}` in `url` with a URL-escaped interpolation of the
/// matching parameter variable.
pub fn path_expression(url: &str, parameters: &[ParameterDescriptor], in_container: bool) -> String {
    PATH_PARAM
        .replace_all(url, |caps: &Captures| {
            let placeholder = &caps[1];
            let var = parameters
                .iter()
                .find(|p| p.name == placeholder)
                .map(|p| p.var.as_str())
                .unwrap_or(placeholder);
            if in_container {
                format!("${{encodeURIComponent(params.{var})}}")
            } else {
                format!("${{encodeURIComponent({var})}}")
            }
        })
        .into_owned()
}

struct Responses {
    by_code: IndexMap<String, ResponseDescriptor>,
    result_type: TypeExpr,
    result_description: Option<String>,
    returns_headers: bool,
}

fn is_success_code(code: &str) -> bool {
    code.parse::<u16>()
        .map(|status| (200..300).contains(&status))
        .unwrap_or(false)
}

fn build_responses(
    document: &Value,
    definition: &Map<String, Value>,
) -> Result<Responses, CompileError> {
    let mut by_code = IndexMap::new();
    let mut success: Vec<TypeExpr> = Vec::new();
    let mut descriptions: Vec<&str> = Vec::new();
    let mut returns_headers = false;

    let empty = Map::new();
    let declared = definition
        .get("responses")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    for (code, response) in declared {
        let response = deref(document, response)?;
        let Some(schema) = response.get("schema").filter(|s| !s.is_null()) else {
            continue;
        };
        let response_type = property_type(schema);
        if is_success_code(code) {
            success.push(response_type.clone());
            if let Some(description) = response.get("description").and_then(Value::as_str) {
                if !description.is_empty() {
                    descriptions.push(description);
                }
            }
            if response
                .get("headers")
                .and_then(Value::as_object)
                .is_some_and(|headers| !headers.is_empty())
            {
                returns_headers = true;
            }
        }
        by_code.insert(
            code.clone(),
            ResponseDescriptor {
                code: code.clone(),
                response_type,
            },
        );
    }

    let result_type = match success.len() {
        0 => TypeExpr::null(),
        1 => success.remove(0),
        _ => TypeExpr::join(&success, " | "),
    };
    Ok(Responses {
        by_code,
        result_type,
        result_description: if descriptions.is_empty() {
            None
        } else {
            Some(descriptions.join(" or "))
        },
        returns_headers,
    })
}

/// Classifies a result type. Aliases are seen through to their target;
/// `Unknown` is the fallback.
pub fn classify_result(result: &TypeExpr, models: &ModelTable) -> ResultKind {
    let model = result.bare_name().and_then(|name| models.get(&name));
    let is_array = result.is_array();
    let actual = match model.and_then(|m| m.alias()) {
        Some(alias) if !is_array => alias.text(),
        _ => result.text(),
    };

    match actual {
        "null" | "void" => ResultKind::Void,
        "string" => ResultKind::String,
        "number" => ResultKind::Number,
        "boolean" => ResultKind::Boolean,
        BLOB_TYPE => ResultKind::File,
        _ => match model {
            Some(m) if m.is_enum() && !is_array => ResultKind::Enum,
            Some(m) if m.is_enum() => ResultKind::PrimitiveArray,
            Some(m) if m.is_object() => ResultKind::Object,
            None if is_array => ResultKind::PrimitiveArray,
            _ => ResultKind::Unknown,
        },
    }
}

fn operation_doc(
    definition: &Map<String, Value>,
    item: &Map<String, Value>,
    parameters: &[ParameterDescriptor],
    params_class: Option<&str>,
    service_class: &str,
    result_description: Option<&str>,
) -> String {
    let text = |map: &Map<String, Value>, key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let mut doc = text(definition, "description");
    let mut summary = text(definition, "summary");
    if summary.is_empty() {
        summary = text(item, "summary");
    }
    if !summary.is_empty() {
        doc = if doc.is_empty() {
            summary
        } else {
            format!("{summary}\n\n{doc}")
        };
    }

    match params_class {
        None => {
            for param in parameters {
                doc.push_str(&format!(
                    "\n@param {} {}",
                    param.name,
                    param.description.as_deref().unwrap_or_default()
                ));
            }
        }
        Some(params_class) => {
            doc.push_str(&format!(
                "\n@param params The `{service_class}.{params_class}` containing the following parameters:\n"
            ));
            for param in parameters {
                doc.push_str(&format!("\n- `{}`: ", param.name));
                let description = param.description.as_deref().unwrap_or_default().trim();
                for (i, line) in description.split('\n').enumerate() {
                    if line.is_empty() {
                        doc.push('\n');
                    } else {
                        if i > 0 {
                            doc.push_str("  ");
                        }
                        doc.push_str(line);
                        doc.push('\n');
                    }
                }
            }
        }
    }

    if let Some(result_description) = result_description {
        doc.push_str("\n@return ");
        doc.push_str(result_description);
    }
    doc
}

/// Uses global tag metadata as service documentation.
fn attach_tag_descriptions(document: &Value, services: &mut ServiceTable, options: &CompileOptions) {
    let Some(tags) = document.get("tags").and_then(Value::as_array) else {
        return;
    };
    for tag in tags {
        let Some(description) = tag.get("description").and_then(Value::as_str) else {
            continue;
        };
        let name = tag_name(tag.get("name").and_then(Value::as_str), &options.default_tag);
        if let Some(service) = services.get_mut(&name) {
            service.description = Some(description.to_string());
            service.comments = to_comments(Some(description), 0);
        }
    }
}

fn resolve_service_dependencies(service: &mut ServiceDescriptor, models: &ModelTable) {
    let mut dependencies = DependencyResolver::new(models, None);
    let mut error_dependencies = DependencyResolver::new(models, None);
    for operation in &service.operations {
        for (code, response) in &operation.responses {
            // `default` and other non-numeric codes count as neither
            let Ok(status) = code.parse::<u16>() else {
                continue;
            };
            if (200..300).contains(&status) {
                dependencies.add(&response.response_type);
            } else {
                error_dependencies.add(&response.response_type);
            }
        }
        for param in &operation.parameters {
            dependencies.add(&param.param_type);
        }
    }
    service.dependencies = dependencies.into_dependencies();
    service.error_dependencies = error_dependencies.into_dependencies();
}
