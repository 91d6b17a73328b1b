//! Configuration management

use std::{env, path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::transport::HttpMethod;
use crate::{Error, Result};

/// Environment variable prefix (`IGNITION_MCP_GATEWAY__API_KEY`, ...)
pub const ENV_PREFIX: &str = "IGNITION_MCP_";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gateway connection and credentials
    pub gateway: GatewayConfig,
    /// API description and endpoint selection
    pub openapi: OpenApiConfig,
    /// Composite tag-write handler settings
    pub tag_write: TagWriteConfig,
    /// HTTP front end
    pub server: ServerConfig,
}

/// Gateway connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the Ignition Gateway
    pub url: String,
    /// API key (takes precedence over username/password)
    pub api_key: String,
    /// Header carrying the API key
    pub api_key_header: String,
    /// Username for basic authentication
    pub username: String,
    /// Password for basic authentication
    pub password: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Accept self-signed gateway certificates
    pub accept_invalid_certs: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8088".to_string(),
            api_key: String::new(),
            api_key_header: "X-Ignition-API-Token".to_string(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }
}

/// API description configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// Path to the OpenAPI document (JSON or YAML)
    pub spec_path: PathBuf,
    /// Path prefixes to expose as tools (empty = built-in allow-list)
    pub include_prefixes: Vec<String>,
    /// Only generate tools for GET operations
    pub read_only: bool,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from("ignition_openapi.json"),
            include_prefixes: Vec::new(),
            read_only: false,
        }
    }
}

/// Downstream resource for the `write_tag` handler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagWriteConfig {
    /// Resource path receiving tag payloads
    pub path: String,
    /// HTTP method used for the write
    pub method: String,
    /// Default tag provider (sent as the `provider` query parameter)
    pub provider: Option<String>,
    /// Collision policy query parameter (e.g. `Overwrite`)
    pub collision_policy: Option<String>,
}

impl Default for TagWriteConfig {
    fn default() -> Self {
        Self {
            path: "/data/api/v1/tags/import".to_string(),
            method: "POST".to_string(),
            provider: Some("default".to_string()),
            collision_policy: Some("Overwrite".to_string()),
        }
    }
}

impl TagWriteConfig {
    /// Parsed HTTP method
    pub fn http_method(&self) -> Result<HttpMethod> {
        HttpMethod::parse(&self.method).ok_or_else(|| {
            Error::Config(format!("Unsupported tag_write method '{}'", self.method))
        })
    }
}

/// HTTP front end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional YAML file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // .env in the working directory
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }

        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Check values that would only fail later at call time
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.gateway.url).map_err(|e| {
            Error::Config(format!("Invalid gateway URL '{}': {e}", self.gateway.url))
        })?;
        self.tag_write.http_method()?;
        if !self.tag_write.path.starts_with('/') {
            return Err(Error::Config(format!(
                "tag_write.path must start with '/': {}",
                self.tag_write.path
            )));
        }
        Ok(())
    }

    /// Expand `${VAR}` and `${VAR:-default}` in credential fields
    fn expand_env_vars(&mut self) {
        let Ok(re) = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") else {
            return;
        };

        for value in [
            &mut self.gateway.url,
            &mut self.gateway.api_key,
            &mut self.gateway.username,
            &mut self.gateway.password,
        ] {
            *value = Self::expand_string(&re, value);
        }
    }

    fn expand_string(re: &Regex, value: &str) -> String {
        re.replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
    }
}
