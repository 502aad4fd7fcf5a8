//! Compilation entry point.
//!
//! Runs the phases in order: models, then services (which classify results
//! against the models), then tag filtering over both tables.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CompileError;
use crate::filter::TagFilter;
use crate::model::{build_models, ModelTable};
use crate::naming::{to_class_name, to_file_name};
use crate::operation::{build_services, ServiceTable};
use crate::types::CompileOptions;

const SUPPORTED_VERSION: &str = "2.0";

/// The pruned model and service tables, plus names shared by every
/// generated artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledApi {
    pub models: ModelTable,
    pub services: ServiceTable,
    pub globals: ApiGlobals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGlobals {
    pub prefix: String,
    pub module_class: String,
    pub module_file: String,
    pub configuration_class: String,
    pub configuration_interface: String,
    pub configuration_file: String,
    pub root_url: String,
    pub enum_module: bool,
    pub error_handler: bool,
    pub api_module: bool,
    pub model_index: bool,
    pub service_index: bool,
}

impl ApiGlobals {
    pub fn new(document: &Value, options: &CompileOptions) -> Self {
        let prefix = &options.prefix;
        let module_class = to_class_name(&format!("{prefix}Module"));
        let mut module_file = to_file_name(&module_class);
        if let Some(stem) = module_file.strip_suffix("-module") {
            module_file = format!("{stem}.module");
        }
        let configuration_class = to_class_name(&format!("{prefix}Configuration"));

        Self {
            prefix: prefix.clone(),
            module_file,
            module_class,
            configuration_interface: to_class_name(&format!("{prefix}ConfigurationInterface")),
            configuration_file: to_file_name(&configuration_class),
            configuration_class,
            root_url: root_url(document),
            enum_module: options.enum_module,
            error_handler: options.error_handler,
            api_module: options.api_module,
            model_index: options.model_index,
            service_index: options.service_index,
        }
    }
}

/// Base URL from `schemes`, `host` and `basePath`. Without schemes the URL
/// is protocol-relative.
pub fn root_url(document: &Value) -> String {
    let mut url = String::new();
    if let Some(host) = document.get("host").and_then(Value::as_str).filter(|h| !h.is_empty()) {
        let scheme = document
            .get("schemes")
            .and_then(Value::as_array)
            .and_then(|schemes| schemes.first())
            .and_then(Value::as_str);
        match scheme {
            Some(scheme) => url.push_str(&format!("{scheme}://")),
            None => url.push_str("//"),
        }
        url.push_str(host);
    }
    if let Some(base_path) = document
        .get("basePath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty() && *p != "/")
    {
        url.push_str(base_path);
    }
    url
}

/// Compile a Swagger 2.0 document into model and service descriptors.
///
/// # Errors
///
/// Returns `CompileError::UnsupportedVersion` unless `swagger` is `"2.0"`,
/// and any error from model or service building.
///
/// # Example
///
/// ```
/// use swagger_ir::{compile, CompileOptions};
/// use serde_json::json;
///
/// let document = json!({
///     "swagger": "2.0",
///     "definitions": {"Pet": {"type": "object"}},
///     "paths": {}
/// });
/// let api = compile(&document, &CompileOptions::default()).unwrap();
/// assert!(api.models.is_empty());
/// assert_eq!(api.globals.module_file, "api.module");
/// ```
pub fn compile(document: &Value, options: &CompileOptions) -> Result<CompiledApi, CompileError> {
    check_version(document)?;

    let mut models = build_models(document, options)?;
    let mut services = build_services(document, &models, options)?;
    TagFilter::new(options).apply(&mut models, &mut services);
    mark_last(&mut models, &mut services);

    info!(
        models = models.len(),
        services = services.len(),
        "Compiled document."
    );
    Ok(CompiledApi {
        globals: ApiGlobals::new(document, options),
        models,
        services,
    })
}

fn check_version(document: &Value) -> Result<(), CompileError> {
    match document.get("swagger") {
        Some(Value::String(version)) if version == SUPPORTED_VERSION => {
            debug!(version = %version, "Document version accepted.");
            Ok(())
        }
        // Numeric versions are rejected too, `2.0` must be a string
        Some(other) => Err(CompileError::UnsupportedVersion {
            found: other.as_str().map_or_else(|| other.to_string(), String::from),
        }),
        None => Err(CompileError::UnsupportedVersion {
            found: String::new(),
        }),
    }
}

fn mark_last(models: &mut ModelTable, services: &mut ServiceTable) {
    let count = models.len();
    for (i, model) in models.values_mut().enumerate() {
        model.is_last = i + 1 == count;
    }
    let count = services.len();
    for (i, service) in services.values_mut().enumerate() {
        service.is_last = i + 1 == count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_other_versions() {
        for document in [json!({"openapi": "3.0.0"}), json!({"swagger": "1.2"}), json!({"swagger": 2.0})] {
            let result = compile(&document, &CompileOptions::default());
            assert!(matches!(result, Err(CompileError::UnsupportedVersion { .. })));
        }
    }

    #[test]
    fn root_url_variants() {
        assert_eq!(
            root_url(&json!({"schemes": ["https", "http"], "host": "api.example.com", "basePath": "/v2"})),
            "https://api.example.com/v2"
        );
        assert_eq!(
            root_url(&json!({"host": "api.example.com", "basePath": "/"})),
            "//api.example.com"
        );
        assert_eq!(root_url(&json!({"basePath": "/v2"})), "/v2");
        assert_eq!(root_url(&json!({"host": ""})), "");
    }

    #[test]
    fn globals_from_prefix() {
        let mut options = CompileOptions::default();
        options.prefix = "PetStore".to_string();
        options.model_index = false;
        let globals = ApiGlobals::new(&json!({}), &options);
        assert_eq!(globals.module_class, "PetStoreModule");
        assert_eq!(globals.module_file, "pet-store.module");
        assert_eq!(globals.configuration_class, "PetStoreConfiguration");
        assert_eq!(
            globals.configuration_interface,
            "PetStoreConfigurationInterface"
        );
        assert_eq!(globals.configuration_file, "pet-store-configuration");
        assert!(!globals.model_index);
        assert!(globals.service_index);
    }

    #[test]
    fn last_model_and_service_marked_after_filtering() {
        let document = json!({
            "swagger": "2.0",
            "definitions": {
                "Pet": {"type": "object"},
                "Store": {"type": "object"}
            },
            "paths": {
                "/pets": {"get": {"tags": ["pet"], "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Pet"}}}}},
                "/store": {"get": {"tags": ["store"], "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Store"}}}}}
            }
        });
        let options = CompileOptions::new().exclude_tags(["store"]);
        let api = compile(&document, &options).unwrap();

        assert_eq!(api.models.len(), 1);
        assert!(api.models.get("Pet").unwrap().is_last);
        assert_eq!(api.services.len(), 1);
        assert!(api.services["Pet"].is_last);
    }

    #[test]
    fn serializes_tables_and_globals() {
        let document = json!({
            "swagger": "2.0",
            "definitions": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}},
            "paths": {
                "/pets": {"get": {"operationId": "listPets", "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Pet"}}}}}
            }
        });
        let api = compile(&document, &CompileOptions::default()).unwrap();
        let value = serde_json::to_value(&api).unwrap();

        assert_eq!(value["models"]["pet"]["kind"], "object");
        assert_eq!(value["models"]["pet"]["className"], "Pet");
        assert_eq!(value["models"]["pet"]["properties"][0]["type"], "string");
        let operation = &value["services"]["Api"]["operations"][0];
        assert_eq!(operation["method"], "GET");
        assert_eq!(operation["resultKind"], "object");
        assert_eq!(operation["responseType"], "json");
        assert_eq!(value["globals"]["moduleClass"], "ApiModule");
    }
}
