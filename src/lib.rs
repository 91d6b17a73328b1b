//! Ignition MCP
//!
//! Exposes an Ignition Gateway REST API as MCP tools. The tool set is compiled
//! from the gateway's `OpenAPI` description: every selected operation becomes a
//! tool with a flat input schema, and calls are translated back into HTTP
//! requests at run time. A handful of hand-written tools (connectivity probe,
//! gateway status, tool summary, composite tag write) sit beside the generated
//! ones and are indistinguishable to callers.
//!
//! # Layout
//!
//! - [`openapi`]: document model, endpoint filter, naming, schema compiler
//! - [`catalog`]: lazily built, shared tool catalog
//! - [`handlers`]: hand-written tools
//! - [`dispatcher`]: request reconstruction and result normalization
//! - [`transport`]: HTTP client seam
//! - [`server`]: stdio and HTTP front ends

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod protocol;
pub mod server;
pub mod transport;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// Logs go to stderr; stdout carries the stdio protocol.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Internal(e.to_string()))?;
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Internal(e.to_string()))?;
        }
    }

    Ok(())
}
