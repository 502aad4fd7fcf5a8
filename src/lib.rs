//! Swagger IR Compiler
//!
//! Compiles Swagger 2.0 documents into a typed intermediate representation
//! for client code generation.
//!
//! The compiler turns every named definition into a model descriptor and
//! every path operation into an operation descriptor grouped into services
//! by tag. Types are rendered as TypeScript-flavoured type expressions that
//! also carry the model names they depend on, so services and models can be
//! pruned by reachability.
//!
//! # Example
//!
//! ```
//! use swagger_ir::{compile, CompileOptions, ResultKind};
//! use serde_json::json;
//!
//! let document = json!({
//!     "swagger": "2.0",
//!     "definitions": {
//!         "Animal": {"type": "object", "properties": {"id": {"type": "integer"}}},
//!         "Pet": {
//!             "allOf": [
//!                 {"$ref": "#/definitions/Animal"},
//!                 {"properties": {"name": {"type": "string"}}}
//!             ]
//!         }
//!     },
//!     "paths": {
//!         "/pets/{id}": {
//!             "get": {
//!                 "tags": ["pet"],
//!                 "operationId": "getPet",
//!                 "parameters": [{"name": "id", "in": "path", "type": "integer"}],
//!                 "responses": {
//!                     "200": {"description": "The pet", "schema": {"$ref": "#/definitions/Pet"}}
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let api = compile(&document, &CompileOptions::default()).unwrap();
//!
//! let pet = api.models.get("Pet").unwrap();
//! assert_eq!(pet.parents, vec!["Animal"]);
//! assert_eq!(pet.dependencies, vec!["Animal"]);
//!
//! let operation = &api.services["Pet"].operations[0];
//! assert_eq!(operation.path_expression, "/pets/${encodeURIComponent(id)}");
//! assert_eq!(operation.result_kind, ResultKind::Object);
//! ```
//!
//! # Result Classification
//!
//! | Result type | Kind | Response type |
//! |-------------|------|---------------|
//! | `Blob` | file | blob |
//! | `null`, `void` | void | text |
//! | `string`, `number`, `boolean` | string, number, boolean | text |
//! | enum model | enum | text |
//! | object model, or array of one | object | json |
//! | array of primitives or enums | primitiveArray | json |
//! | anything else | unknown | json |

mod compiler;
mod dependencies;
mod error;
mod filter;
mod loader;
mod model;
mod naming;
mod operation;
mod resolver;
mod schema;
mod typeexpr;
mod types;

pub use compiler::{compile, root_url, ApiGlobals, CompiledApi};
pub use dependencies::DependencyResolver;
pub use error::{CompileError, LoadError};
pub use filter::{collect_dependencies, TagFilter};
pub use loader::{
    inline_refs, is_url, load_config, load_document, load_document_auto, load_document_str,
    resolve_local_ref,
};
pub use model::{build_models, EnumValue, ModelDescriptor, ModelKind, ModelTable, PropertyDescriptor};
pub use naming::{to_class_name, to_file_name, to_identifier};
pub use operation::{
    build_services, classify_result, HttpMethod, OperationDescriptor, ParamLocation,
    ParameterDescriptor, ResponseDescriptor, ResponseType, ResultKind, ServiceDescriptor,
    ServiceTable,
};
pub use resolver::{property_type, resolve_type};
pub use schema::SchemaNode;
pub use typeexpr::TypeExpr;
pub use types::{split_tags, CompileOptions, FileSuffixes, SortParams};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
