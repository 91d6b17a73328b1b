//! Connectivity and discovery tools

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{CustomHandler, HandlerContext};
use crate::catalog::ToolDefinition;
use crate::dispatcher::{ToolResult, normalize};
use crate::openapi::InputSchema;
use crate::transport::{HttpMethod, HttpRequest};

/// Gateway resource serving the API description
pub const OPENAPI_PATH: &str = "/openapi.json";

/// Gateway network status resource
pub const GATEWAY_STATUS_PATH: &str = "/system/gateway-network/remote-servers/status";

/// `test_connection`: probe the gateway by fetching its API description
pub struct TestConnection;

#[async_trait]
impl CustomHandler for TestConnection {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::custom(
            "test_connection",
            "Test connection to the Ignition Gateway",
            InputSchema::new(),
        )
    }

    async fn call(&self, _arguments: Value, ctx: &HandlerContext) -> ToolResult {
        match ctx.send(HttpRequest::new(HttpMethod::Get, OPENAPI_PATH)).await {
            Ok(_) => ToolResult::success(json!({
                "status": "success",
                "message": "Connection successful",
            })),
            Err(e) => ToolResult::success(json!({
                "status": "error",
                "message": format!("Connection failed: {e}"),
            })),
        }
    }
}

/// `get_gateway_status`: remote gateway network status
pub struct GatewayStatus;

#[async_trait]
impl CustomHandler for GatewayStatus {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::custom(
            "get_gateway_status",
            "Get Ignition Gateway network status",
            InputSchema::new(),
        )
    }

    async fn call(&self, _arguments: Value, ctx: &HandlerContext) -> ToolResult {
        match ctx
            .send(HttpRequest::new(HttpMethod::Get, GATEWAY_STATUS_PATH))
            .await
        {
            Ok(response) => ToolResult::success(normalize(response)),
            Err(e) => ToolResult::error(format!("Failed to get gateway status: {e}")),
        }
    }
}

/// `list_available_tools`: catalog summary grouped by category
pub struct ListAvailableTools;

#[async_trait]
impl CustomHandler for ListAvailableTools {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::custom(
            "list_available_tools",
            "List all available Ignition tools grouped by category",
            InputSchema::new(),
        )
    }

    async fn call(&self, _arguments: Value, ctx: &HandlerContext) -> ToolResult {
        match ctx.catalog().get() {
            Ok(catalog) => ToolResult::success(catalog.summary()),
            Err(e) => ToolResult::success(json!({
                "error": e.to_string(),
                "total_tools": 0,
                "categories": {},
            })),
        }
    }
}
