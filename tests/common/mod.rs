//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use ignition_mcp::config::Config;
use ignition_mcp::dispatcher::Dispatcher;
use ignition_mcp::openapi::{OpenApiSpec, SpecSource, StaticSpecSource};
use ignition_mcp::transport::{
    HttpRequest, HttpResponse, ResponseBody, Transport, TransportError,
};

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that records every request and answers from a closure
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responder: Box<Responder>,
}

impl RecordingTransport {
    /// Answers every request with `{"ok": true}`
    pub fn new() -> Self {
        Self::with_responder(|_| {
            Ok(HttpResponse {
                status: 200,
                body: ResponseBody::Json(json!({"ok": true})),
            })
        })
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.responder)(&request);
        self.requests.lock().push(request);
        response
    }
}

/// Spec source that counts loads and takes a while to parse
pub struct SlowSource {
    document: Value,
    delay: Duration,
    pub loads: AtomicUsize,
}

impl SlowSource {
    pub fn new(document: Value, delay: Duration) -> Self {
        Self {
            document,
            delay,
            loads: AtomicUsize::new(0),
        }
    }
}

impl SpecSource for SlowSource {
    fn load(&self) -> ignition_mcp::Result<OpenApiSpec> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        OpenApiSpec::from_value(self.document.clone())
    }

    fn describe(&self) -> String {
        "slow test source".to_string()
    }
}

/// A small gateway API description
pub fn gateway_spec() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": {"title": "Ignition Gateway", "version": "8.3.0"},
        "paths": {
            "/data/api/v1/projects": {
                "get": {"summary": "List projects"},
                "post": {
                    "summary": "Create a project",
                    "requestBody": {
                        "required": true,
                        "content": {"application/json": {"schema": {
                            "$ref": "#/components/schemas/Project"
                        }}}
                    }
                }
            },
            "/data/api/v1/projects/{name}": {
                "parameters": [{"$ref": "#/components/parameters/ProjectName"}],
                "get": {"summary": "Get a project"},
                "put": {
                    "summary": "Update a project",
                    "requestBody": {
                        "content": {"application/json": {"schema": {
                            "$ref": "#/components/schemas/Project"
                        }}}
                    }
                },
                "delete": {"summary": "Delete a project"}
            },
            "/data/api/v1/tags/{provider}": {
                "get": {
                    "summary": "Browse tags",
                    "parameters": [
                        {"name": "provider", "in": "path", "required": true,
                         "schema": {"type": "string"}},
                        {"name": "recursive", "in": "query", "required": true,
                         "schema": {"type": "boolean"}}
                    ]
                }
            },
            "/data/api/v1/tags/import": {
                "post": {
                    "summary": "Import tags",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "array", "items": {"type": "object"}
                    }}}}
                }
            },
            "/data/api/v1/users": {"get": {"summary": "List users"}},
            "/data/api/v1/logs": {"get": {"summary": "Old logs", "deprecated": true}},
            "/system/gateway-network/remote-servers/status": {
                "get": {"summary": "Remote gateway status"}
            }
        },
        "components": {
            "parameters": {
                "ProjectName": {"name": "name", "in": "path", "required": true,
                                "schema": {"type": "string"}, "description": "Project name"}
            },
            "schemas": {
                "Project": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "enabled": {"type": "boolean"}
                    }
                }
            }
        }
    })
}

/// Config with an API key
pub fn api_key_config() -> Config {
    let mut config = Config::default();
    config.gateway.api_key = "test-key".to_string();
    config
}

/// Dispatcher over the fixture API and a recording transport
pub fn dispatcher_with(config: &Config, transport: Arc<RecordingTransport>) -> Dispatcher {
    Dispatcher::with_transport(
        config,
        Arc::new(StaticSpecSource::new(gateway_spec())),
        transport,
    )
}
