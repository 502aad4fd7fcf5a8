//! Document loading and local reference lookup.
//!
//! Handles loading Swagger documents and configuration from files, strings,
//! and HTTP URLs.

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{CompileError, LoadError};
use crate::types::CompileOptions;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the response
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Load compile options from a JSON configuration file.
///
/// Keys are camelCase (`includeTags`, `minParamsForContainer`, ...); missing
/// keys take their defaults and unknown keys are ignored.
pub fn load_config(path: &Path) -> Result<CompileOptions, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a local reference (`#/parameters/limit`) within `document`.
///
/// A reference to the document root resolves to `null`, never to the
/// document itself.
///
/// # Errors
///
/// Returns `CompileError::UnresolvedReference` if the reference is not local
/// or points nowhere.
pub fn resolve_local_ref<'a>(document: &'a Value, reference: &str) -> Result<&'a Value, CompileError> {
    static EMPTY: Value = Value::Null;
    let unresolved = || CompileError::UnresolvedReference {
        reference: reference.to_string(),
    };

    let path = reference.strip_prefix("#/").ok_or_else(unresolved)?;
    let mut current = document;
    for part in path.split('/').filter(|p| !p.is_empty()) {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = current.get(&key).ok_or_else(unresolved)?;
    }
    if std::ptr::eq(current, document) {
        return Ok(&EMPTY);
    }
    Ok(current)
}

/// Returns `value` with every local `$ref` replaced by its target, recursively.
///
/// References already being expanded on the current path are left in place,
/// so self-referencing examples terminate.
pub fn inline_refs(value: &Value, document: &Value) -> Result<Value, CompileError> {
    inline_refs_inner(value, document, &mut HashSet::new())
}

fn inline_refs_inner(
    value: &Value,
    document: &Value,
    visiting: &mut HashSet<String>,
) -> Result<Value, CompileError> {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if visiting.contains(reference) {
                    return Ok(value.clone());
                }
                let target = resolve_local_ref(document, reference)?;
                visiting.insert(reference.to_string());
                let inlined = inline_refs_inner(target, document, visiting);
                visiting.remove(reference);
                return match inlined? {
                    Value::Null => Ok(Value::Object(Map::new())),
                    other => Ok(other),
                };
            }
            let mut result = Map::new();
            for (key, child) in map {
                result.insert(key.clone(), inline_refs_inner(child, document, visiting)?);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| inline_refs_inner(item, document, visiting))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}
