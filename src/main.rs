//! Ignition MCP - Ignition Gateway REST API as MCP tools

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use ignition_mcp::{
    cli::{Cli, Command},
    config::Config,
    dispatcher::Dispatcher,
    handlers::OPENAPI_PATH,
    server::{AppState, McpHandler, serve_http, serve_stdio},
    setup_tracing,
    transport::{HttpMethod, HttpRequest, ResponseBody},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = match Dispatcher::from_config(&config) {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => {
            error!(error = %e, "Failed to initialize");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::ServeHttp { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            run_http(dispatcher, &host, port).await
        }
        Some(Command::Tools { summary }) => run_tools(&dispatcher, summary),
        Some(Command::Call { name, args }) => run_call(&dispatcher, &name, &args).await,
        Some(Command::FetchSpec { output }) => {
            let output = output.unwrap_or_else(|| config.openapi.spec_path.clone());
            run_fetch_spec(&dispatcher, output).await
        }
        Some(Command::ServeStdio) | None => run_stdio(dispatcher).await,
    }
}

async fn run_stdio(dispatcher: Arc<Dispatcher>) -> ExitCode {
    warm_catalog(&dispatcher).await;
    match serve_stdio(McpHandler::new(dispatcher)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "stdio server error");
            ExitCode::FAILURE
        }
    }
}

async fn run_http(dispatcher: Arc<Dispatcher>, host: &str, port: u16) -> ExitCode {
    warm_catalog(&dispatcher).await;

    let state = Arc::new(AppState::new(dispatcher));
    match serve_http(state, host, port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "HTTP server error");
            ExitCode::FAILURE
        }
    }
}

/// Build the catalog off the async workers before serving
async fn warm_catalog(dispatcher: &Arc<Dispatcher>) {
    let dispatcher = Arc::clone(dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.warm_catalog()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => error!(error = %e, "Tool catalog unavailable, serving anyway"),
        Err(e) => error!(error = %e, "Catalog warm-up task failed"),
    }
}

fn run_tools(dispatcher: &Dispatcher, summary: bool) -> ExitCode {
    let catalog = match dispatcher.catalog().get() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    if summary {
        match serde_json::to_string_pretty(&catalog.summary()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize summary: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{} tool(s):\n", catalog.len());
    for tool in catalog.tools() {
        match tool.operation() {
            Some(op) => println!("🔧 {:<48} {} {}", tool.name, op.method, op.path),
            None => println!("✨ {:<48} {}", tool.name, tool.description),
        }
    }
    ExitCode::SUCCESS
}

async fn run_call(dispatcher: &Dispatcher, name: &str, args: &str) -> ExitCode {
    let arguments: Value = match serde_json::from_str(args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("❌ Invalid JSON arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = dispatcher.call(name, arguments).await;
    if result.is_error() {
        eprintln!("❌ {}", result.text());
        return ExitCode::FAILURE;
    }
    println!("{}", result.text());
    ExitCode::SUCCESS
}

async fn run_fetch_spec(dispatcher: &Dispatcher, output: PathBuf) -> ExitCode {
    let request = HttpRequest::new(HttpMethod::Get, OPENAPI_PATH);
    let response = match dispatcher.context().send(request).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("❌ Failed to fetch {OPENAPI_PATH}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let content = match response.body {
        ResponseBody::Json(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("❌ Failed to serialize spec: {e}");
                return ExitCode::FAILURE;
            }
        },
        ResponseBody::Text(text) => text,
        ResponseBody::Empty => {
            eprintln!("❌ Gateway returned an empty document");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::fs::write(&output, content).await {
        eprintln!("❌ Failed to write {}: {e}", output.display());
        return ExitCode::FAILURE;
    }

    dispatcher.catalog().invalidate();
    info!(path = %output.display(), "Saved OpenAPI spec");
    println!("✅ Saved OpenAPI spec to {}", output.display());
    ExitCode::SUCCESS
}
