//! Hand-written tools
//!
//! A [`CustomHandler`] takes the raw argument map and runs bespoke logic
//! instead of the generic request translation. Handlers are registered once at
//! startup and are checked before the catalog, so they shadow any generated
//! tool of the same name.

mod builtin;
mod tag_write;

pub use builtin::{
    GATEWAY_STATUS_PATH, GatewayStatus, ListAvailableTools, OPENAPI_PATH, TestConnection,
};
pub use tag_write::{TagWriteArgs, WriteTag, build_tag_payload};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthStrategy;
use crate::catalog::{ToolCatalog, ToolDefinition};
use crate::config::TagWriteConfig;
use crate::dispatcher::ToolResult;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Shared collaborators handed to every handler call
#[derive(Clone)]
pub struct HandlerContext {
    transport: Arc<dyn Transport>,
    auth: AuthStrategy,
    catalog: Arc<ToolCatalog>,
    tag_write: TagWriteConfig,
}

impl HandlerContext {
    /// Bundle the collaborators
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: AuthStrategy,
        catalog: Arc<ToolCatalog>,
        tag_write: TagWriteConfig,
    ) -> Self {
        Self {
            transport,
            auth,
            catalog,
            tag_write,
        }
    }

    /// Send a request with the authentication header attached
    ///
    /// # Errors
    ///
    /// Returns the transport failure (non-2xx, connection, timeout, decode).
    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some((name, value)) = self.auth.header() {
            request.headers.push((name, value));
        }
        debug!(method = %request.method, path = %request.path, "Gateway request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status, "Gateway response");
        Ok(response)
    }

    /// Authentication in use
    #[must_use]
    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    /// Tool catalog
    #[must_use]
    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Tag write target
    #[must_use]
    pub fn tag_write(&self) -> &TagWriteConfig {
        &self.tag_write
    }
}

/// A tool implemented by hand
#[async_trait]
pub trait CustomHandler: Send + Sync {
    /// Catalog entry for this tool
    fn definition(&self) -> ToolDefinition;

    /// Run the tool
    async fn call(&self, arguments: Value, ctx: &HandlerContext) -> ToolResult;
}

/// Handlers by tool name
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn CustomHandler>>,
    definitions: Vec<ToolDefinition>,
}

impl HandlerRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TestConnection));
        registry.register(Arc::new(GatewayStatus));
        registry.register(Arc::new(ListAvailableTools));
        registry.register(Arc::new(WriteTag));
        registry
    }

    /// Add a handler; a later registration under the same name replaces the earlier one
    pub fn register(&mut self, handler: Arc<dyn CustomHandler>) {
        let definition = handler.definition();
        self.definitions.retain(|d| d.name != definition.name);
        self.handlers.insert(definition.name.clone(), handler);
        self.definitions.push(definition);
    }

    /// Handler registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomHandler>> {
        self.handlers.get(name)
    }

    /// Definitions in registration order
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    /// Number of handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
