//! HTTP transport to the Ignition Gateway
//!
//! The dispatcher talks to the gateway through the [`Transport`] trait so the
//! request reconstruction logic can be exercised without a network. The
//! production implementation is [`HttpTransport`] (reqwest).

mod http;

pub use self::http::HttpTransport;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// HTTP methods the gateway API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Methods in the order operations are visited during catalog generation
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Upper-case wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Lower-case form used in generated tool names
    #[must_use]
    pub fn lower(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Parse a method name, case-insensitively
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request, relative to the gateway base URL
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path with placeholders already substituted
    pub path: String,
    /// Query-string pairs
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Extra headers (authentication)
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a request with no query, body or headers
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Attach a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response body as delivered by the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON document
    Json(Value),
    /// Non-JSON text
    Text(String),
    /// No content
    Empty,
}

/// Successful (2xx) gateway response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed body
    pub body: ResponseBody,
}

/// Transport-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Gateway answered with a non-2xx status
    #[error("Gateway returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response excerpt
        message: String,
    },

    /// TCP/TLS connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The request could not be built or sent
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Capability to send authenticated requests to the gateway
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request; non-2xx statuses are returned as [`TransportError::Status`]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
