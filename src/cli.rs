//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ignition Gateway REST API as MCP tools
#[derive(Parser, Debug)]
#[command(name = "ignition-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "IGNITION_MCP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "IGNITION_MCP_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "IGNITION_MCP_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to stdio server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve MCP over stdin/stdout (default)
    ServeStdio,

    /// Serve MCP and the REST tool surface over HTTP
    ServeHttp {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List generated and custom tools
    Tools {
        /// Print the category summary as JSON instead of names
        #[arg(long)]
        summary: bool,
    },

    /// Call a tool once and print the result
    Call {
        /// Tool name
        #[arg(required = true)]
        name: String,

        /// JSON arguments
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Download the gateway's OpenAPI description
    FetchSpec {
        /// Output file (defaults to openapi.spec_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
