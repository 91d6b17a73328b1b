//! Tool dispatch
//!
//! Resolves a tool name (custom handlers first, then the catalog), rebuilds
//! the HTTP request from the flat argument map and normalizes the gateway's
//! answer into a [`ToolResult`]. Calling never fails: every problem ends up in
//! the result envelope.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::auth::AuthStrategy;
use crate::catalog::{ToolCatalog, ToolInfo, ToolKind};
use crate::config::Config;
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::openapi::{
    BODY_PREFIX, EndpointFilter, FieldSpec, FileSpecSource, InputSchema, OperationDescriptor,
    Route, SpecSource,
};
use crate::protocol::{Content, ToolsCallResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ResponseBody, Transport};
use crate::{Error, Result};

const CATALOG_HINT: &str =
    "Check openapi.spec_path and that the file is a valid OpenAPI document";

/// Outcome of a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload on success, message (or structured detail) on failure
    pub content: Value,
}

impl ToolResult {
    /// Successful result
    #[must_use]
    pub fn success(content: Value) -> Self {
        Self { ok: true, content }
    }

    /// Failed result carrying a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            content: Value::String(message.into()),
        }
    }

    /// Failed result from a library error
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        Self::error(err.to_string())
    }

    /// Whether the call failed
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.ok
    }

    /// Content as display text: strings as-is, anything else pretty-printed
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

impl From<ToolResult> for ToolsCallResult {
    fn from(result: ToolResult) -> Self {
        Self {
            content: vec![Content::Text {
                text: result.text(),
            }],
            is_error: result.is_error(),
        }
    }
}

/// Normalize a successful gateway response
#[must_use]
pub fn normalize(response: HttpResponse) -> Value {
    match response.body {
        ResponseBody::Json(value) => value,
        ResponseBody::Text(text) => json!({"status": "success", "content": text}),
        ResponseBody::Empty => json!({"status": "success", "status_code": response.status}),
    }
}

/// Render an argument as a path or query value
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Percent-encode one path segment value
fn encode_path_value(value: &Value) -> String {
    url::form_urlencoded::byte_serialize(scalar_string(value).as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn push_query(query: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items.iter().filter(|v| !v.is_null()) {
                query.push((key.to_string(), scalar_string(item)));
            }
        }
        other => query.push((key.to_string(), scalar_string(other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accept an object or null as an argument map
///
/// # Errors
///
/// Returns [`Error::InvalidArguments`] for any other JSON value.
pub fn argument_map(arguments: Value) -> Result<Map<String, Value>> {
    match arguments {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidArguments(format!(
            "expected a JSON object, got {}",
            value_kind(&other)
        ))),
    }
}

/// Rebuild the HTTP request for a generated tool
///
/// # Errors
///
/// Returns [`Error::InvalidArguments`] for a non-object argument value and
/// [`Error::MissingRequiredField`] when a required field is absent or null.
pub fn build_request(
    tool: &str,
    operation: &OperationDescriptor,
    schema: &InputSchema,
    arguments: Value,
) -> Result<HttpRequest> {
    let args = argument_map(arguments)?;

    if let Some(missing) = schema
        .required()
        .find(|name| args.get(*name).is_none_or(Value::is_null))
    {
        return Err(Error::MissingRequiredField {
            tool: tool.to_string(),
            field: missing.to_string(),
        });
    }

    let mut path = operation.path.clone();
    let mut query = Vec::new();
    let mut body_fields = Map::new();
    let mut whole_body = None;

    for (key, value) in args {
        if value.is_null() {
            continue;
        }
        match schema.field(&key).map(FieldSpec::route) {
            Some(Route::Path(name)) => {
                path = path.replace(&format!("{{{name}}}"), &encode_path_value(&value));
            }
            Some(Route::Query(name)) => push_query(&mut query, name, &value),
            Some(Route::Unrouted) => push_query(&mut query, &key, &value),
            Some(Route::BodyKey(name)) => {
                body_fields.insert(name.to_string(), value);
            }
            Some(Route::WholeBody) => whole_body = Some(value),
            None => {
                if let Some(name) = key.strip_prefix(BODY_PREFIX) {
                    debug!(tool = %tool, argument = %key, "Undeclared argument routed to body");
                    body_fields.insert(name.to_string(), value);
                } else {
                    debug!(tool = %tool, argument = %key, "Undeclared argument routed to query");
                    push_query(&mut query, &key, &value);
                }
            }
        }
    }

    let body = match whole_body {
        Some(Value::Object(mut object)) => {
            object.extend(body_fields);
            Some(Value::Object(object))
        }
        Some(other) => {
            if !body_fields.is_empty() {
                warn!(tool = %tool, "Body fields ignored: request body is not an object");
            }
            Some(other)
        }
        None if body_fields.is_empty() => None,
        None => Some(Value::Object(body_fields)),
    };

    Ok(HttpRequest {
        method: operation.method,
        path,
        query,
        body,
        headers: Vec::new(),
    })
}

/// Entry point for listing and calling tools
pub struct Dispatcher {
    registry: HandlerRegistry,
    context: HandlerContext,
}

impl Dispatcher {
    /// Wire a dispatcher from its parts
    #[must_use]
    pub fn new(registry: HandlerRegistry, context: HandlerContext) -> Self {
        Self { registry, context }
    }

    /// Dispatcher with the built-in handlers over a given spec source and transport
    pub fn with_transport(
        config: &Config,
        source: Arc<dyn SpecSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let registry = HandlerRegistry::builtin();
        let filter = EndpointFilter::new(&config.openapi.include_prefixes)
            .read_only(config.openapi.read_only);
        let catalog =
            Arc::new(ToolCatalog::new(source, filter).with_custom_tools(registry.definitions()));
        let context = HandlerContext::new(
            transport,
            AuthStrategy::from_config(&config.gateway),
            catalog,
            config.tag_write.clone(),
        );
        Self::new(registry, context)
    }

    /// Production dispatcher: spec file on disk, reqwest transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.gateway)?);
        let source = Arc::new(FileSpecSource::new(&config.openapi.spec_path));
        let dispatcher = Self::with_transport(config, source, transport);
        info!(
            gateway = %config.gateway.url,
            auth = dispatcher.context.auth().kind(),
            handlers = dispatcher.registry.len(),
            "Dispatcher ready"
        );
        Ok(dispatcher)
    }

    /// Shared tool catalog
    #[must_use]
    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        self.context.catalog()
    }

    /// Handler context (transport, auth, catalog)
    #[must_use]
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Build the catalog ahead of the first request
    ///
    /// # Errors
    ///
    /// Returns the catalog build error.
    pub fn warm_catalog(&self) -> Result<usize> {
        let catalog = self.context.catalog().get()?;
        info!(count = catalog.len(), "Tool catalog ready");
        Ok(catalog.len())
    }

    /// All tools, generated and custom
    ///
    /// # Errors
    ///
    /// Returns the catalog build error.
    pub fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let catalog = self.context.catalog().get()?;
        Ok(catalog.tools().iter().map(|t| t.info()).collect())
    }

    /// Call a tool by name
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        if let Some(handler) = self.registry.get(name) {
            debug!(tool = %name, "Dispatching to custom handler");
            return handler.call(arguments, &self.context).await;
        }

        let catalog = match self.context.catalog().get() {
            Ok(catalog) => catalog,
            Err(e) => {
                return ToolResult::error(format!(
                    "Tool catalog unavailable: {e}. {CATALOG_HINT}"
                ));
            }
        };

        let Some(tool) = catalog.get(name) else {
            return ToolResult::from_error(&Error::ToolNotFound(name.to_string()));
        };

        let ToolKind::Generated { operation, schema } = &tool.kind else {
            return ToolResult::from_error(&Error::Internal(format!(
                "no handler registered for custom tool '{name}'"
            )));
        };

        let request = match build_request(name, operation, schema, arguments) {
            Ok(request) => request,
            Err(e) => return ToolResult::from_error(&e),
        };

        match self.context.send(request).await {
            Ok(response) => ToolResult::success(normalize(response)),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                ToolResult::error(format!("Tool '{name}' failed: {e}"))
            }
        }
    }
}
