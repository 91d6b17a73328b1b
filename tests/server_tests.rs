//! Front ends and the reqwest transport against local servers

mod common;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::BufReader;
use tokio::net::TcpListener;

use common::{RecordingTransport, api_key_config, dispatcher_with};
use ignition_mcp::config::GatewayConfig;
use ignition_mcp::server::{AppState, McpHandler, create_router, serve};
use ignition_mcp::transport::{
    HttpMethod, HttpRequest, HttpTransport, ResponseBody, Transport, TransportError,
};

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn handler() -> (McpHandler, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = dispatcher_with(&api_key_config(), Arc::clone(&transport));
    (McpHandler::new(Arc::new(dispatcher)), transport)
}

#[tokio::test]
async fn test_stdio_session() {
    let (handler, transport) = handler();
    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}).to_string(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        String::new(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}).to_string(),
        json!({"jsonrpc": "2.0", "id": "call-1", "method": "tools/call",
               "params": {"name": "get_projects_name", "arguments": {"name": "Production"}}})
        .to_string(),
        json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"}).to_string(),
        "{not json".to_string(),
    ]
    .join("\n");

    let mut output = Vec::new();
    serve(handler, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 5);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "ignition-mcp");
    assert!(responses[0]["result"]["capabilities"]["tools"].is_object());

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 12);
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

    assert_eq!(responses[2]["id"], "call-1");
    assert_eq!(responses[2]["result"]["isError"], false);
    assert_eq!(
        transport.last().path,
        "/data/api/v1/projects/Production"
    );

    assert_eq!(responses[3]["error"]["code"], -32601);
    assert_eq!(responses[4]["error"]["code"], -32700);
    assert_eq!(responses[4]["id"], Value::Null);
}

#[tokio::test]
async fn test_tools_call_error_is_result_not_rpc_error() {
    let (handler, _) = handler();
    let response = handler
        .handle_value(json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call",
                             "params": {"name": "nope"}}))
        .await
        .unwrap();
    let value = serde_json::to_value(response).unwrap();
    assert!(value.get("error").is_none());
    assert_eq!(value["result"]["isError"], true);
    assert_eq!(value["result"]["content"][0]["text"], "Tool 'nope' not found");
}

#[tokio::test]
async fn test_http_surface() {
    let (handler, transport) = handler();
    let state = Arc::new(AppState::new(Arc::clone(handler.dispatcher())));
    let base = spawn(create_router(state)).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["tools"], 12);

    let tools: Value = client
        .get(format!("{base}/tools"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tools["tools"].as_array().unwrap().len(), 12);

    let called: Value = client
        .post(format!("{base}/tools/post_projects"))
        .json(&json!({"arguments": {"body_name": "NewProject"}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        called,
        json!({"success": true, "data": {"ok": true}, "error": null})
    );
    assert_eq!(transport.last().body, Some(json!({"name": "NewProject"})));

    let missing: Value = client
        .post(format!("{base}/tools/nope"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing["success"], false);
    assert_eq!(missing["error"], "Tool 'nope' not found");

    let rpc: Value = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rpc["result"], json!({}));

    let notification = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .send()
        .await
        .unwrap();
    assert_eq!(notification.status(), reqwest::StatusCode::ACCEPTED);
}

fn fake_gateway() -> Router {
    Router::new()
        .route(
            "/data/api/v1/projects",
            get(|headers: HeaderMap| async move {
                let token = headers
                    .get("X-Ignition-API-Token")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"projects": ["Production"], "token": token}))
            }),
        )
        .route(
            "/data/api/v1/projects/{name}",
            get(|| async { (StatusCode::NOT_FOUND, "Project not found") })
                .delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/system/gateway",
            get(|| async { "RUNNING" }),
        )
        .route(
            "/data/api/v1/logs",
            get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                Json(json!({"query": query}))
            }),
        )
}

fn gateway_config(url: String) -> GatewayConfig {
    GatewayConfig {
        url,
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_http_transport_response_kinds() {
    let base = spawn(fake_gateway()).await;
    let transport = HttpTransport::new(&gateway_config(base)).unwrap();

    let json_response = transport
        .send(
            HttpRequest::new(HttpMethod::Get, "/data/api/v1/projects")
                .with_header("X-Ignition-API-Token", "secret"),
        )
        .await
        .unwrap();
    assert_eq!(json_response.status, 200);
    assert_eq!(
        json_response.body,
        ResponseBody::Json(json!({"projects": ["Production"], "token": "secret"}))
    );

    let text = transport
        .send(HttpRequest::new(HttpMethod::Get, "/system/gateway"))
        .await
        .unwrap();
    assert_eq!(text.body, ResponseBody::Text("RUNNING".to_string()));

    let empty = transport
        .send(HttpRequest::new(HttpMethod::Delete, "/data/api/v1/projects/Old"))
        .await
        .unwrap();
    assert_eq!(empty.status, 204);
    assert_eq!(empty.body, ResponseBody::Empty);

    let mut with_query = HttpRequest::new(HttpMethod::Get, "/data/api/v1/logs");
    with_query.query = vec![
        ("level".to_string(), "WARN".to_string()),
        ("logger".to_string(), "tags store".to_string()),
    ];
    let logs = transport.send(with_query).await.unwrap();
    assert_eq!(
        logs.body,
        ResponseBody::Json(json!({"query": "level=WARN&logger=tags+store"}))
    );
}

#[tokio::test]
async fn test_http_transport_status_error() {
    let base = spawn(fake_gateway()).await;
    let transport = HttpTransport::new(&gateway_config(base)).unwrap();

    let err = transport
        .send(HttpRequest::new(HttpMethod::Get, "/data/api/v1/projects/Nope"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 404,
            message: "Project not found".to_string()
        }
    );

    let err = transport
        .send(HttpRequest::new(HttpMethod::Get, "/unknown"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_http_transport_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let transport = HttpTransport::new(&gateway_config(format!("http://127.0.0.1:{port}"))).unwrap();

    let err = transport
        .send(HttpRequest::new(HttpMethod::Get, "/openapi.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
}
