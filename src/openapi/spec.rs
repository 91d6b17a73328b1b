//! In-memory `OpenAPI` document model
//!
//! Only the parts the tool compiler needs are typed. The raw document is kept
//! alongside so local `$ref`s can be resolved with JSON pointers.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::transport::HttpMethod;
use crate::{Error, Result};

/// Maximum `$ref` hops before giving up (guards against cycles)
const MAX_REF_DEPTH: usize = 32;

/// Parsed `OpenAPI` document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiSpec {
    /// `OpenAPI` 3.x version string
    #[serde(default)]
    pub openapi: Option<String>,
    /// Swagger 2.0 version string
    #[serde(default)]
    pub swagger: Option<String>,
    /// Document info
    #[serde(default)]
    pub info: SpecInfo,
    /// Paths, sorted by template
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip)]
    raw: Value,
}

/// Document info block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecInfo {
    /// API title
    #[serde(default)]
    pub title: String,
    /// API version
    #[serde(default)]
    pub version: String,
}

/// All operations under one path template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default)]
    get: Option<Operation>,
    #[serde(default)]
    post: Option<Operation>,
    #[serde(default)]
    put: Option<Operation>,
    #[serde(default)]
    patch: Option<Operation>,
    #[serde(default)]
    delete: Option<Operation>,
}

impl PathItem {
    /// Operation declared for a method
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }
}

/// A single operation, as declared
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation id
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Short summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Parameters (inline or `$ref`)
    #[serde(default)]
    pub parameters: Vec<Value>,
    /// Request body (inline or `$ref`)
    #[serde(default)]
    pub request_body: Option<Value>,
    /// Deprecated flag
    #[serde(default)]
    pub deprecated: bool,
    /// Grouping tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path placeholder
    Path,
    /// Query string
    Query,
    /// Request header
    Header,
    /// Cookie
    Cookie,
}

/// A resolved parameter declaration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Location
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Required flag
    #[serde(default)]
    pub required: bool,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Value schema
    #[serde(default)]
    pub schema: Option<Value>,
}

/// A resolved request body declaration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Whether a body must be sent
    #[serde(default)]
    pub required: bool,
    /// Schemas by media type
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// Schema for `application/json`, else the first media type that has one
    #[must_use]
    pub fn json_schema(&self) -> Option<&Value> {
        self.content
            .get("application/json")
            .and_then(|m| m.schema.as_ref())
            .or_else(|| self.content.values().find_map(|m| m.schema.as_ref()))
    }
}

/// Media type object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    /// Body schema
    #[serde(default)]
    pub schema: Option<Value>,
}

impl OpenApiSpec {
    /// Parse a document from YAML or JSON text
    pub fn parse_str(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| Error::SpecLoad(format!("not valid JSON or YAML: {e}")))?;
        Self::from_value(raw)
    }

    /// Build a document from an already-parsed JSON value
    pub fn from_value(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(Error::SpecLoad("document is not an object".to_string()));
        }
        let mut spec: Self = serde_json::from_value(raw.clone())
            .map_err(|e| Error::SpecLoad(format!("unexpected document shape: {e}")))?;
        if spec.openapi.is_none() && spec.swagger.is_none() {
            return Err(Error::SpecLoad(
                "missing 'openapi' or 'swagger' version field".to_string(),
            ));
        }
        spec.raw = raw;
        Ok(spec)
    }

    /// Version string of the document
    #[must_use]
    pub fn version(&self) -> &str {
        self.openapi
            .as_deref()
            .or(self.swagger.as_deref())
            .unwrap_or("unknown")
    }

    /// Every declared (path, method) pair, sorted by path then method
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &PathItem, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            HttpMethod::ALL.into_iter().filter_map(move |method| {
                item.operation(method)
                    .map(|op| (path.as_str(), method, item, op))
            })
        })
    }

    /// Follow local `$ref`s until a concrete object is reached
    ///
    /// Unresolvable references are returned as-is.
    #[must_use]
    pub fn resolve<'a>(&'a self, value: &'a Value) -> &'a Value {
        let mut current = value;
        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return current;
            };
            match reference
                .strip_prefix('#')
                .and_then(|pointer| self.raw.pointer(pointer))
            {
                Some(target) => current = target,
                None => {
                    warn!(reference = %reference, "Unresolvable $ref");
                    return current;
                }
            }
        }
        warn!("$ref chain too deep, possible cycle");
        current
    }

    /// Resolve and type a parameter declaration
    pub fn parameter(&self, value: &Value) -> Result<Parameter> {
        serde_json::from_value(self.resolve(value).clone())
            .map_err(|e| Error::SpecLoad(format!("invalid parameter: {e}")))
    }

    /// Resolve and type a request body declaration
    pub fn request_body(&self, value: &Value) -> Result<RequestBody> {
        serde_json::from_value(self.resolve(value).clone())
            .map_err(|e| Error::SpecLoad(format!("invalid request body: {e}")))
    }

    /// Resolve a schema and flatten `allOf` members into one object schema
    #[must_use]
    pub fn flatten_schema(&self, schema: &Value) -> Value {
        self.flatten_at(schema, &mut Vec::new())
    }

    /// `active` holds the `$ref`s being flattened on the current path
    fn flatten_at<'a>(&'a self, schema: &'a Value, active: &mut Vec<&'a str>) -> Value {
        let reference = schema.get("$ref").and_then(Value::as_str);
        if let Some(reference) = reference {
            if active.contains(&reference) || active.len() >= MAX_REF_DEPTH {
                warn!(reference = %reference, "Cyclic allOf, member skipped");
                return serde_json::json!({"type": "object"});
            }
        }
        let resolved = self.resolve(schema);
        let Some(members) = resolved.get("allOf").and_then(Value::as_array) else {
            return resolved.clone();
        };

        let mut properties = serde_json::Map::new();
        let mut required: Vec<Value> = Vec::new();
        active.extend(reference);
        for member in members {
            let member = self.flatten_at(member, active);
            if let Some(props) = member.get("properties").and_then(Value::as_object) {
                for (k, v) in props {
                    properties.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            if let Some(req) = member.get("required").and_then(Value::as_array) {
                for r in req {
                    if !required.contains(r) {
                        required.push(r.clone());
                    }
                }
            }
        }

        if reference.is_some() {
            active.pop();
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
