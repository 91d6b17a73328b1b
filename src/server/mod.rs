//! MCP front ends
//!
//! Both the stdio and the HTTP surface feed JSON-RPC messages through the same
//! [`McpHandler`], which is a thin layer over [`Dispatcher`].

mod http;
mod stdio;

pub use http::{AppState, create_router, serve_http};
pub use stdio::{serve, serve_stdio};

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::rpc_codes;
use crate::protocol::{
    Info, InitializeResult, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION,
    RequestId, ServerCapabilities, Tool, ToolsCallParams, ToolsCallResult, ToolsCapability,
    ToolsListResult,
};

const INSTRUCTIONS: &str = "Tools for an Ignition Gateway. Generated tools mirror the gateway \
REST API: path parameters keep their names and request-body properties are prefixed with body_.";

/// JSON-RPC handler shared by all front ends
#[derive(Clone)]
pub struct McpHandler {
    dispatcher: Arc<Dispatcher>,
}

impl McpHandler {
    /// Handler over a dispatcher
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Underlying dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handle one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_value(message).await,
            Err(e) => Some(JsonRpcResponse::error(
                None,
                rpc_codes::PARSE_ERROR,
                format!("Parse error: {e}"),
            )),
        }
    }

    /// Handle one decoded message; `None` for notifications
    pub async fn handle_value(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = message
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        match serde_json::from_value::<JsonRpcMessage>(message) {
            Ok(JsonRpcMessage::Request(request)) => Some(self.handle_request(request).await),
            Ok(JsonRpcMessage::Notification(notification)) => {
                debug!(method = %notification.method, "Notification ignored");
                None
            }
            Err(e) => Some(JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!(id = %id, method = %method, "Request");

        match method.as_str() {
            "initialize" => respond(
                id,
                &InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: false,
                        }),
                    },
                    server_info: Info {
                        name: env!("CARGO_PKG_NAME").to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                    instructions: Some(INSTRUCTIONS.to_string()),
                },
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => match self.dispatcher.list_tools() {
                Ok(tools) => respond(
                    id,
                    &ToolsListResult {
                        tools: tools.into_iter().map(Tool::from).collect(),
                        next_cursor: None,
                    },
                ),
                Err(e) => {
                    warn!(error = %e, "tools/list failed");
                    JsonRpcResponse::error(Some(id), e.to_rpc_code(), e.to_string())
                }
            },
            "tools/call" => {
                let params = match serde_json::from_value::<ToolsCallParams>(
                    params.unwrap_or(Value::Null),
                ) {
                    Ok(params) => params,
                    Err(e) => {
                        return JsonRpcResponse::error(
                            Some(id),
                            rpc_codes::INVALID_PARAMS,
                            format!("Invalid tools/call params: {e}"),
                        );
                    }
                };
                let result = self.dispatcher.call(&params.name, params.arguments).await;
                respond(id, &ToolsCallResult::from(result))
            }
            other => JsonRpcResponse::error(
                Some(id),
                rpc_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }
}

fn respond<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}
