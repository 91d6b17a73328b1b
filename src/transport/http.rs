//! reqwest-backed gateway transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use tracing::debug;

use super::{HttpMethod, HttpRequest, HttpResponse, ResponseBody, Transport, TransportError};
use crate::config::GatewayConfig;
use crate::{Error, Result};

/// Longest response excerpt carried in an error message
const MAX_ERROR_EXCERPT: usize = 500;

/// HTTP transport for the Ignition Gateway REST API
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Gateway base URL without trailing slash
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from the gateway configuration
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        url::Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid gateway URL '{}': {e}", config.url)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Gateway base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Error text with its source chain (`a: b: c`)
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

fn classify(err: &reqwest::Error) -> TransportError {
    let message = describe(err);
    if err.is_timeout() {
        TransportError::Timeout(message)
    } else if err.is_connect() {
        TransportError::Connect(message)
    } else {
        TransportError::Request(message)
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(MAX_ERROR_EXCERPT).collect()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "Sending gateway request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .header(header::ACCEPT, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(&e))?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let text = response.text().await.map_err(|e| classify(&e))?;

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                excerpt(&text)
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = if text.trim().is_empty() {
            ResponseBody::Empty
        } else if is_json {
            ResponseBody::Json(
                serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?,
            )
        } else {
            ResponseBody::Text(text)
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> GatewayConfig {
        GatewayConfig {
            url: url.to_string(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let transport = HttpTransport::new(&config("http://localhost:8088/")).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8088");
        assert_eq!(
            transport.url_for("/data/api/v1/projects"),
            "http://localhost:8088/data/api/v1/projects"
        );
        assert_eq!(
            transport.url_for("openapi.json"),
            "http://localhost:8088/openapi.json"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = HttpTransport::new(&config("not a url")).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(2_000);
        assert_eq!(excerpt(&long).len(), MAX_ERROR_EXCERPT);
    }
}
