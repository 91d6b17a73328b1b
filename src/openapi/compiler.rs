//! Operation descriptors and flat input schemas

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::schema::{FieldSpec, FieldType, InputSchema};
use super::spec::{Operation, OpenApiSpec, Parameter, ParameterLocation, PathItem};
use crate::transport::HttpMethod;

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^{}/]+)\}").expect("static regex"))
}

/// Placeholder names of a path template, in order of appearance, without repeats
#[must_use]
pub fn path_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in placeholder_re().captures_iter(template) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Everything known about one (path, method) pair, with references resolved
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Path template, e.g. `/data/api/v1/projects/{name}`
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Declared operation id
    pub operation_id: Option<String>,
    /// Summary, else description, else `METHOD path`
    pub description: String,
    /// Path-item parameters merged with operation parameters
    pub parameters: Vec<Parameter>,
    /// Request body schema with `allOf` flattened
    pub body_schema: Option<Value>,
    /// Whether the request body is required
    pub body_required: bool,
    /// Deprecated flag
    pub deprecated: bool,
    /// Grouping tags
    pub tags: Vec<String>,
}

/// Turns declared operations into descriptors and input schemas
pub struct ParameterCompiler<'a> {
    spec: &'a OpenApiSpec,
}

impl<'a> ParameterCompiler<'a> {
    /// Compiler over one document
    #[must_use]
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self { spec }
    }

    /// Resolve references and collect the operation's metadata
    #[must_use]
    pub fn describe(
        &self,
        path: &str,
        method: HttpMethod,
        item: &PathItem,
        operation: &Operation,
    ) -> OperationDescriptor {
        let mut parameters: Vec<Parameter> = Vec::new();
        // operation-level declarations override path-level ones
        for raw in operation.parameters.iter().chain(&item.parameters) {
            match self.spec.parameter(raw) {
                Ok(param) => {
                    if !parameters
                        .iter()
                        .any(|p| p.name == param.name && p.location == param.location)
                    {
                        parameters.push(param);
                    }
                }
                Err(e) => warn!(path = %path, method = %method, error = %e, "Skipping parameter"),
            }
        }

        let (body_schema, body_required) = match operation.request_body.as_ref() {
            Some(raw) => match self.spec.request_body(raw) {
                Ok(body) => (
                    body.json_schema().map(|s| self.spec.flatten_schema(s)),
                    body.required,
                ),
                Err(e) => {
                    warn!(path = %path, method = %method, error = %e, "Skipping request body");
                    (None, false)
                }
            },
            None => (None, false),
        };

        let description = operation
            .summary
            .as_deref()
            .or(operation.description.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("{method} {path}"), ToString::to_string);

        OperationDescriptor {
            path: path.to_string(),
            method,
            operation_id: operation.operation_id.clone(),
            description,
            parameters,
            body_schema,
            body_required,
            deprecated: operation.deprecated,
            tags: operation.tags.clone(),
        }
    }

    /// Build the flat input schema of an operation
    #[must_use]
    pub fn compile(&self, operation: &OperationDescriptor) -> InputSchema {
        let mut schema = InputSchema::new();
        let placeholders = path_placeholders(&operation.path);

        for name in &placeholders {
            let declared = operation
                .parameters
                .iter()
                .find(|p| p.location == ParameterLocation::Path && &p.name == name);
            let mut field = FieldSpec::path(
                name.as_str(),
                declared.map_or(FieldType::String, |p| self.field_type(p.schema.as_ref())),
            );
            field.description = declared.and_then(|p| p.description.clone());
            self.push(&mut schema, field, operation);
        }

        for param in &operation.parameters {
            match param.location {
                ParameterLocation::Header | ParameterLocation::Cookie => {
                    debug!(
                        path = %operation.path,
                        parameter = %param.name,
                        "Header/cookie parameter not exposed"
                    );
                }
                ParameterLocation::Path if placeholders.contains(&param.name) => {}
                ParameterLocation::Path | ParameterLocation::Query => {
                    let mut field = FieldSpec::query(
                        param.name.as_str(),
                        self.field_type(param.schema.as_ref()),
                        param.required,
                    );
                    field.description = param.description.clone();
                    self.push(&mut schema, field, operation);
                }
            }
        }

        if let Some(body) = &operation.body_schema {
            self.compile_body(&mut schema, body, operation);
        }

        schema
    }

    fn compile_body(
        &self,
        schema: &mut InputSchema,
        body: &Value,
        operation: &OperationDescriptor,
    ) {
        let properties = body
            .get("properties")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty());

        let Some(properties) = properties else {
            let mut field = FieldSpec::raw_body(
                FieldType::from_schema(Some(body)),
                operation.body_required,
            );
            field.description = description_of(body);
            self.push(schema, field, operation);
            return;
        };

        let required: Vec<&str> = body
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (name, prop) in properties {
            let prop = self.spec.resolve(prop);
            let mut field = FieldSpec::body(
                name,
                FieldType::from_schema(Some(prop)),
                required.contains(&name.as_str()),
            );
            field.description = description_of(prop);
            self.push(schema, field, operation);
        }
    }

    fn field_type(&self, schema: Option<&Value>) -> FieldType {
        FieldType::from_schema(schema.map(|s| self.spec.resolve(s)))
    }

    fn push(&self, schema: &mut InputSchema, field: FieldSpec, operation: &OperationDescriptor) {
        let name = field.name.clone();
        if !schema.push(field) {
            warn!(
                path = %operation.path,
                method = %operation.method,
                field = %name,
                "Duplicate input field dropped"
            );
        }
    }
}

fn description_of(schema: &Value) -> Option<String> {
    schema
        .get("description")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
