//! Composite tag write
//!
//! Builds a tag definition from structured arguments (or takes a caller-made
//! payload verbatim) and forwards it to the configured tag resource.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{CustomHandler, HandlerContext};
use crate::catalog::ToolDefinition;
use crate::dispatcher::{ToolResult, argument_map, normalize};
use crate::openapi::{FieldSpec, FieldType, InputSchema};
use crate::transport::HttpRequest;
use crate::{Error, Result};

const TOOL_NAME: &str = "write_tag";
const OVERRIDE_FIELD: &str = "payload_override";

/// Arguments accepted by `write_tag`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWriteArgs {
    /// Full tag path, e.g. `[default]Line1/Motor/Speed`
    pub tag_path: Option<String>,
    /// Value to write
    pub value: Option<Value>,
    /// Ignition data type (`Int4`, `Float8`, `String`, ...)
    pub data_type: Option<String>,
    /// Extra tag properties merged into the definition
    pub attributes: Option<Map<String, Value>>,
    /// Value timestamp
    pub timestamp: Option<Value>,
    /// Quality code, name or number
    pub quality: Option<Value>,
    /// Tag provider, overrides the configured default
    pub provider: Option<String>,
    /// Payload sent as-is, bypassing the structured fields
    #[serde(rename = "payload_override")]
    pub payload_override: Option<Value>,
}

impl TagWriteArgs {
    /// Arguments for an override call; structured fields other than
    /// `provider` are not read
    fn with_override(map: &Map<String, Value>, payload: Value) -> Self {
        Self {
            provider: map
                .get("provider")
                .and_then(Value::as_str)
                .map(str::to_string),
            payload_override: Some(payload),
            ..Self::default()
        }
    }
}

/// Tag name from a tag path: last segment, provider prefix removed
fn tag_name(tag_path: &str) -> &str {
    let last = tag_path.rsplit('/').next().unwrap_or(tag_path);
    match last.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        Some((_, name)) => name,
        None => last,
    }
}

/// Payload for a tag write
///
/// # Errors
///
/// Returns [`Error::MissingRequiredField`] when neither `tagPath` nor
/// `payload_override` is given.
pub fn build_tag_payload(args: &TagWriteArgs) -> Result<Value> {
    if let Some(payload) = &args.payload_override {
        return Ok(payload.clone());
    }

    let tag_path = args
        .tag_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::MissingRequiredField {
            tool: TOOL_NAME.to_string(),
            field: "tagPath".to_string(),
        })?;

    let mut tag = Map::new();
    tag.insert("tagPath".to_string(), json!(tag_path));
    tag.insert("name".to_string(), json!(tag_name(tag_path)));
    tag.insert("tagType".to_string(), json!("AtomicTag"));
    let optionals = [
        ("value", args.value.clone()),
        ("dataType", args.data_type.clone().map(Value::String)),
        ("timestamp", args.timestamp.clone()),
        ("quality", args.quality.clone()),
    ];
    for (key, value) in optionals {
        if let Some(value) = value {
            tag.insert(key.to_string(), value);
        }
    }
    if let Some(attributes) = &args.attributes {
        tag.extend(attributes.clone());
    }

    Ok(Value::Object(tag))
}

/// `write_tag` handler
pub struct WriteTag;

impl WriteTag {
    fn request(args: &TagWriteArgs, ctx: &HandlerContext) -> Result<HttpRequest> {
        let settings = ctx.tag_write();
        let mut request = HttpRequest::new(settings.http_method()?, settings.path.clone());
        if let Some(provider) = args.provider.as_ref().or(settings.provider.as_ref()) {
            request.query.push(("provider".to_string(), provider.clone()));
        }
        if let Some(policy) = &settings.collision_policy {
            request
                .query
                .push(("collisionPolicy".to_string(), policy.clone()));
        }
        request.body = Some(build_tag_payload(args)?);
        Ok(request)
    }
}

#[async_trait]
impl CustomHandler for WriteTag {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::custom(
            TOOL_NAME,
            "Write a tag value, building the tag definition from structured fields",
            InputSchema::new()
                .with(
                    FieldSpec::argument("tagPath", FieldType::String, false)
                        .describe("Full tag path, e.g. [default]Line1/Motor/Speed"),
                )
                .with(
                    FieldSpec::argument("value", FieldType::Any, false)
                        .describe("Value to write"),
                )
                .with(
                    FieldSpec::argument("dataType", FieldType::String, false)
                        .describe("Ignition data type, e.g. Int4, Float8, String"),
                )
                .with(
                    FieldSpec::argument("attributes", FieldType::Object, false)
                        .describe("Additional tag properties merged into the definition"),
                )
                .with(
                    FieldSpec::argument("timestamp", FieldType::Any, false)
                        .describe("Value timestamp"),
                )
                .with(
                    FieldSpec::argument("quality", FieldType::Any, false)
                        .describe("Quality code"),
                )
                .with(
                    FieldSpec::argument("provider", FieldType::String, false)
                        .describe("Tag provider (defaults to the configured provider)"),
                )
                .with(
                    FieldSpec::argument(OVERRIDE_FIELD, FieldType::Any, false)
                        .describe("Payload sent verbatim instead of the built tag definition"),
                ),
        )
    }

    async fn call(&self, arguments: Value, ctx: &HandlerContext) -> ToolResult {
        let map = match argument_map(arguments) {
            Ok(map) => map,
            Err(e) => return ToolResult::from_error(&e),
        };
        let payload = map.get(OVERRIDE_FIELD).filter(|v| !v.is_null()).cloned();
        let args = match payload {
            Some(payload) => TagWriteArgs::with_override(&map, payload),
            None => match serde_json::from_value::<TagWriteArgs>(Value::Object(map)) {
                Ok(args) => args,
                Err(e) => {
                    return ToolResult::from_error(&Error::InvalidArguments(e.to_string()));
                }
            },
        };

        let request = match Self::request(&args, ctx) {
            Ok(request) => request,
            Err(e) => return ToolResult::from_error(&e),
        };

        info!(
            tool = TOOL_NAME,
            method = %request.method,
            path = %request.path,
            override_payload = args.payload_override.is_some(),
            "Writing tag"
        );

        match ctx.send(request).await {
            Ok(response) => ToolResult::success(normalize(response)),
            Err(e) => ToolResult::error(format!("Tag write failed: {e}")),
        }
    }
}
