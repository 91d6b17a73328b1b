//! Catalog construction through the public API

mod common;

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{RecordingTransport, SlowSource, api_key_config, dispatcher_with, gateway_spec};
use ignition_mcp::Error;
use ignition_mcp::catalog::{ToolCatalog, ToolKind};
use ignition_mcp::config::Config;
use ignition_mcp::dispatcher::Dispatcher;
use ignition_mcp::openapi::{
    EndpointFilter, FileSpecSource, Provenance, SpecSource, StaticSpecSource, path_placeholders,
};

#[test]
fn test_generated_and_custom_tools_listed() {
    let dispatcher = dispatcher_with(&api_key_config(), Arc::new(RecordingTransport::new()));
    let tools = dispatcher.list_tools().unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "get_projects",
            "post_projects",
            "get_projects_name",
            "put_projects_name",
            "delete_projects_name",
            "post_tags_import",
            "get_tags_provider",
            "get_system_gateway_network_remote_servers_status",
            "test_connection",
            "get_gateway_status",
            "list_available_tools",
            "write_tag",
        ]
    );

    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}

#[test]
fn test_placeholders_match_required_path_fields() {
    let dispatcher = dispatcher_with(&api_key_config(), Arc::new(RecordingTransport::new()));
    let catalog = dispatcher.catalog().get().unwrap();

    for tool in catalog.tools() {
        let ToolKind::Generated { operation, schema } = &tool.kind else {
            continue;
        };
        let mut path_fields: Vec<_> = schema
            .with_provenance(Provenance::Path)
            .inspect(|f| assert!(f.required, "{}: {} optional", tool.name, f.name))
            .map(|f| f.name.clone())
            .collect();
        let mut placeholders = path_placeholders(&operation.path);
        path_fields.sort();
        placeholders.sort();
        assert_eq!(path_fields, placeholders, "{}", tool.name);
    }
}

#[test]
fn test_input_schema_rendering() {
    let dispatcher = dispatcher_with(&api_key_config(), Arc::new(RecordingTransport::new()));
    let tools = dispatcher.list_tools().unwrap();
    let put = tools
        .iter()
        .find(|t| t.name == "put_projects_name")
        .unwrap();

    assert_eq!(put.description, "Update a project");
    assert_eq!(
        put.input_schema,
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Project name"},
                "body_description": {"type": "string", "description": "description in request body"},
                "body_enabled": {"type": "boolean", "description": "enabled in request body"},
                "body_name": {"type": "string", "description": "name in request body"}
            },
            "required": ["name", "body_name"],
            "additionalProperties": false
        })
    );

    let import = tools.iter().find(|t| t.name == "post_tags_import").unwrap();
    assert_eq!(import.input_schema["properties"]["body"]["type"], "array");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_builds_once() {
    let source = Arc::new(SlowSource::new(gateway_spec(), Duration::from_millis(50)));
    let spec_source: Arc<dyn SpecSource> = Arc::clone(&source) as Arc<dyn SpecSource>;
    let dispatcher = Arc::new(Dispatcher::with_transport(
        &api_key_config(),
        spec_source,
        Arc::new(RecordingTransport::new()),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    dispatcher.list_tools().map(|t| t.len()).unwrap_or(0)
                } else {
                    let result = dispatcher.call("get_projects", json!({})).await;
                    usize::from(result.ok)
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap() > 0);
    }

    assert_eq!(dispatcher.catalog().build_count(), 1);
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_warm_catalog_serves_later_calls() {
    let source = Arc::new(SlowSource::new(gateway_spec(), Duration::from_millis(10)));
    let spec_source: Arc<dyn SpecSource> = Arc::clone(&source) as Arc<dyn SpecSource>;
    let dispatcher = Arc::new(Dispatcher::with_transport(
        &api_key_config(),
        spec_source,
        Arc::new(RecordingTransport::new()),
    ));

    let warm = Arc::clone(&dispatcher);
    let count = tokio::task::spawn_blocking(move || warm.warm_catalog())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 12);

    assert!(dispatcher.call("get_projects", json!({})).await.ok);
    assert_eq!(dispatcher.list_tools().unwrap().len(), 12);
    assert_eq!(dispatcher.catalog().build_count(), 1);
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invalidate_rebuilds_from_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!({"openapi": "3.0.0", "paths": {"/data/api/v1/projects": {"get": {}}}})
    )
    .unwrap();

    let catalog = ToolCatalog::new(
        Arc::new(FileSpecSource::new(file.path())),
        EndpointFilter::default(),
    );
    let before = catalog.get().unwrap();
    assert_eq!(before.len(), 1);

    std::fs::write(
        file.path(),
        json!({"openapi": "3.0.0", "paths": {
            "/data/api/v1/projects": {"get": {}, "post": {}}
        }})
        .to_string(),
    )
    .unwrap();

    // cached until invalidated
    assert_eq!(catalog.get().unwrap().len(), 1);
    catalog.invalidate();
    let after = catalog.get().unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(before.len(), 1);
    assert_eq!(catalog.build_count(), 2);
}

#[test]
fn test_yaml_spec_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "openapi: 3.0.0\npaths:\n  /data/api/v1/modules:\n    get:\n      operationId: listModules\n"
    )
    .unwrap();

    let catalog = ToolCatalog::new(
        Arc::new(FileSpecSource::new(file.path())),
        EndpointFilter::default(),
    );
    let snapshot = catalog.get().unwrap();
    assert!(snapshot.get("list_modules").is_some());
}

#[tokio::test]
async fn test_missing_spec_surfaces_as_results() {
    let mut config = api_key_config();
    config.openapi.spec_path = "/nonexistent/ignition_openapi.json".into();
    let dispatcher = Dispatcher::with_transport(
        &config,
        Arc::new(FileSpecSource::new(&config.openapi.spec_path)),
        Arc::new(RecordingTransport::new()),
    );

    assert!(matches!(dispatcher.list_tools(), Err(Error::SpecLoad(_))));

    let result = dispatcher.call("get_projects", json!({})).await;
    assert!(result.is_error());
    assert!(result.text().contains("spec_path"));

    // custom handlers still work without a catalog
    let summary = dispatcher.call("list_available_tools", json!({})).await;
    assert!(summary.ok);
    assert_eq!(summary.content["total_tools"], 0);
    assert!(summary.content["error"].is_string());

    assert_eq!(dispatcher.catalog().build_count(), 0);
}

#[test]
fn test_include_prefixes_and_read_only() {
    let mut config = Config::default();
    config.openapi.include_prefixes = vec!["/data/api/v1/users".to_string()];
    let dispatcher = Dispatcher::with_transport(
        &config,
        Arc::new(StaticSpecSource::new(gateway_spec())),
        Arc::new(RecordingTransport::new()),
    );
    let names: Vec<_> = dispatcher
        .list_tools()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .filter(|n| n.starts_with("get_") || n.starts_with("post_"))
        .collect();
    assert_eq!(names, vec!["get_users", "get_gateway_status"]);

    let mut config = Config::default();
    config.openapi.read_only = true;
    let dispatcher = Dispatcher::with_transport(
        &config,
        Arc::new(StaticSpecSource::new(gateway_spec())),
        Arc::new(RecordingTransport::new()),
    );
    let catalog = dispatcher.catalog().get().unwrap();
    assert!(
        catalog
            .tools()
            .iter()
            .filter_map(|t| t.operation())
            .all(|op| op.method.as_str() == "GET")
    );
}
