//! `OpenAPI` to tool compilation
//!
//! Reads a gateway API description and derives one tool per selected
//! operation: a stable name, a flat input schema and the metadata needed to
//! rebuild the HTTP request at call time.

mod compiler;
mod filter;
mod loader;
mod naming;
mod schema;
mod spec;

pub use compiler::{OperationDescriptor, ParameterCompiler, path_placeholders};
pub use filter::{DEFAULT_INCLUDE_PREFIXES, EndpointFilter};
pub use loader::{FileSpecSource, SpecSource, StaticSpecSource};
pub use naming::{
    MAX_TOOL_NAME_LEN, NameResolver, base_name, name_from_path, normalize_operation_id,
};
pub use schema::{BODY_PREFIX, FieldSpec, FieldType, InputSchema, Provenance, RAW_BODY_FIELD, Route};
pub use spec::{
    MediaType, OpenApiSpec, Operation, Parameter, ParameterLocation, PathItem, RequestBody,
    SpecInfo,
};
