//! Error types for the Ignition MCP bridge

use std::io;

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for the Ignition MCP bridge
pub type Result<T> = std::result::Result<T, Error>;

/// Ignition MCP errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API description could not be loaded or parsed
    #[error("Failed to load OpenAPI spec: {0}")]
    SpecLoad(String),

    /// Two operations resolved to the same tool name
    #[error("Tool name collision: '{name}' ({first} vs {second})")]
    NameCollision {
        /// Colliding tool name
        name: String,
        /// Operation that claimed the name first
        first: String,
        /// Operation that could not be given a distinct name
        second: String,
    },

    /// No tool registered under the requested name
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    /// A required argument was not supplied
    #[error("Missing required field '{field}' for tool '{tool}'")]
    MissingRequiredField {
        /// Tool being called
        tool: String,
        /// Missing argument name
        field: String,
    },

    /// Arguments were not a JSON object or had the wrong shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Gateway call failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert to JSON-RPC error code
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::Json(_) => rpc_codes::PARSE_ERROR,
            Self::ToolNotFound(_) => rpc_codes::METHOD_NOT_FOUND,
            Self::MissingRequiredField { .. } | Self::InvalidArguments(_) => {
                rpc_codes::INVALID_PARAMS
            }
            Self::Transport(_) => rpc_codes::SERVER_ERROR_START,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// Standard JSON-RPC error codes
pub mod rpc_codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - Not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Server error range start
    pub const SERVER_ERROR_START: i32 = -32000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_keep_their_message() {
        let err = Error::from(TransportError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
        });
        assert_eq!(err.to_string(), "Gateway returned HTTP 401: Unauthorized");
        assert_eq!(err.to_rpc_code(), rpc_codes::SERVER_ERROR_START);
    }

    #[test]
    fn rpc_codes_follow_error_kind() {
        assert_eq!(
            Error::ToolNotFound("x".to_string()).to_rpc_code(),
            rpc_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            Error::MissingRequiredField {
                tool: "t".to_string(),
                field: "f".to_string()
            }
            .to_rpc_code(),
            rpc_codes::INVALID_PARAMS
        );
        assert_eq!(
            Error::SpecLoad("bad".to_string()).to_rpc_code(),
            rpc_codes::INTERNAL_ERROR
        );
    }

    #[test]
    fn missing_field_message_names_the_field() {
        let err = Error::MissingRequiredField {
            tool: "get_projects_name".to_string(),
            field: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required field 'name' for tool 'get_projects_name'"
        );
    }
}
