//! Gateway authentication

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::GatewayConfig;

/// How requests authenticate against the gateway
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// API token in a dedicated header
    ApiKey {
        /// Header name
        header: String,
        /// Token
        key: String,
    },
    /// HTTP basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// No credentials configured
    None,
}

impl AuthStrategy {
    /// Pick a strategy: a non-empty API key wins over username/password
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        if !config.api_key.is_empty() {
            Self::ApiKey {
                header: config.api_key_header.clone(),
                key: config.api_key.clone(),
            }
        } else if !config.username.is_empty() && !config.password.is_empty() {
            Self::Basic {
                username: config.username.clone(),
                password: config.password.clone(),
            }
        } else {
            Self::None
        }
    }

    /// Header to attach to every gateway request
    #[must_use]
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            Self::ApiKey { header, key } => Some((header.clone(), key.clone())),
            Self::Basic { username, password } => Some((
                "Authorization".to_string(),
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
            )),
            Self::None => None,
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey { .. } => "api_key",
            Self::Basic { .. } => "basic",
            Self::None => "none",
        }
    }
}

// Credentials stay out of debug output
impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"***")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::None => f.write_str("None"),
        }
    }
}
