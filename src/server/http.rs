//! HTTP surface

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::McpHandler;
use crate::dispatcher::Dispatcher;
use crate::{Error, Result};

/// Shared application state
pub struct AppState {
    /// JSON-RPC handler (owns the dispatcher)
    pub mcp: McpHandler,
}

impl AppState {
    /// State over a dispatcher
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            mcp: McpHandler::new(dispatcher),
        }
    }

    fn dispatcher(&self) -> &Dispatcher {
        self.mcp.dispatcher()
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(call_tool_handler))
        .route("/mcp", post(mcp_handler))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C / SIGTERM
pub async fn serve_http(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| Error::Config(format!("Invalid listen address {host}:{port}: {e}")))?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dispatcher().catalog().get() {
        Ok(catalog) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "tools": catalog.len(),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "version": env!("CARGO_PKG_VERSION"),
                "error": e.to_string(),
            })),
        ),
    }
}

async fn list_tools_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dispatcher().list_tools() {
        Ok(tools) => (StatusCode::OK, Json(json!({ "tools": tools }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn call_tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let arguments = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(request) => request.get("arguments").cloned().unwrap_or(Value::Null),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "data": null,
                        "error": format!("Invalid JSON: {e}"),
                    })),
                );
            }
        }
    };

    let result = state.dispatcher().call(&name, arguments).await;
    let body = if result.ok {
        json!({"success": true, "data": result.content, "error": null})
    } else {
        json!({"success": false, "data": null, "error": result.text()})
    };
    (StatusCode::OK, Json(body))
}

async fn mcp_handler(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let response = match std::str::from_utf8(&body) {
        Ok(text) => state.mcp.handle_line(text).await,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "jsonrpc": "2.0",
                    "error": {"code": -32700, "message": format!("Invalid UTF-8: {e}")},
                    "id": null
                })),
            )
                .into_response();
        }
    };

    match response {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
