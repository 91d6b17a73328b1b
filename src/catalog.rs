//! Tool catalog
//!
//! Generated tools (one per selected gateway operation) plus the hand-written
//! ones, built once on first use and shared read-only afterwards.
//!
//! The catalog is held as an `Arc<CatalogSnapshot>` behind a mutex that doubles
//! as the single-flight guard: the first caller builds while later callers wait
//! on the lock and then reuse the result. [`ToolCatalog::invalidate`] drops the
//! snapshot; callers still holding the old `Arc` keep a consistent view.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::openapi::{
    EndpointFilter, InputSchema, NameResolver, OpenApiSpec, OperationDescriptor,
    ParameterCompiler, SpecSource,
};
use crate::{Error, Result};

/// Category of hand-written tools in summaries
pub const CUSTOM_CATEGORY: &str = "custom";

/// How a tool is executed
#[derive(Debug, Clone)]
pub enum ToolKind {
    /// Translated into one gateway request
    Generated {
        /// Source operation
        operation: OperationDescriptor,
        /// Input schema with request placement
        schema: InputSchema,
    },
    /// Runs a registered handler
    Custom {
        /// Input schema (fields carry no placement)
        schema: InputSchema,
    },
}

/// A callable tool
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique name
    pub name: String,
    /// Description shown to callers
    pub description: String,
    /// Execution kind
    pub kind: ToolKind,
}

impl ToolDefinition {
    /// Hand-written tool definition
    pub fn custom(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ToolKind::Custom { schema },
        }
    }

    /// Input schema
    #[must_use]
    pub fn schema(&self) -> &InputSchema {
        match &self.kind {
            ToolKind::Generated { schema, .. } | ToolKind::Custom { schema } => schema,
        }
    }

    /// Source operation of a generated tool
    #[must_use]
    pub fn operation(&self) -> Option<&OperationDescriptor> {
        match &self.kind {
            ToolKind::Generated { operation, .. } => Some(operation),
            ToolKind::Custom { .. } => None,
        }
    }

    /// Resource category: the `/data/api/v1/<category>` segment, `system` or `custom`
    #[must_use]
    pub fn category(&self) -> String {
        let Some(op) = self.operation() else {
            return CUSTOM_CATEGORY.to_string();
        };
        if let Some(rest) = op.path.strip_prefix("/data/api/v1/") {
            if let Some(segment) = rest.split('/').next().filter(|s| !s.is_empty()) {
                return segment.to_string();
            }
        }
        if op.path.starts_with("/system") {
            return "system".to_string();
        }
        "other".to_string()
    }

    /// Caller-facing listing entry
    #[must_use]
    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema().to_json_schema(),
        }
    }
}

/// Tool listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Description
    pub description: String,
    /// JSON Schema of the arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Immutable, fully built set of tools
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl CatalogSnapshot {
    /// Compile a document and merge in the hand-written definitions
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameCollision`] when names cannot be made unique.
    pub fn build(
        spec: &OpenApiSpec,
        filter: &EndpointFilter,
        custom: &[ToolDefinition],
    ) -> Result<Self> {
        let compiler = ParameterCompiler::new(spec);
        let mut resolver = NameResolver::new();
        let mut generated = Vec::new();

        for (path, method, item, op) in spec.operations() {
            if !filter.include(path, method, op) {
                debug!(path = %path, method = %method, "Operation filtered out");
                continue;
            }
            let name = resolver.resolve(path, method, op.operation_id.as_deref())?;
            let operation = compiler.describe(path, method, item, op);
            let schema = compiler.compile(&operation);
            generated.push(ToolDefinition {
                name,
                description: operation.description.clone(),
                kind: ToolKind::Generated { operation, schema },
            });
        }

        let mut snapshot = Self::default();
        for tool in generated {
            if custom.iter().any(|c| c.name == tool.name) {
                warn!(tool = %tool.name, "Generated tool shadowed by custom handler");
                continue;
            }
            snapshot.insert(tool)?;
        }
        for tool in custom {
            snapshot.insert(tool.clone())?;
        }

        Ok(snapshot)
    }

    fn insert(&mut self, tool: ToolDefinition) -> Result<()> {
        if let Some(&existing) = self.index.get(&tool.name) {
            return Err(Error::NameCollision {
                name: tool.name.clone(),
                first: describe_origin(&self.tools[existing]),
                second: describe_origin(&tool),
            });
        }
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All tools: generated in visit order, then custom
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Number of tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog holds no tools
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tools grouped by category
    #[must_use]
    pub fn summary(&self) -> Value {
        let mut categories: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for tool in &self.tools {
            let mut entry = json!({
                "name": tool.name,
                "description": tool.description,
            });
            if let Some(op) = tool.operation() {
                entry["method"] = json!(op.method.as_str());
                entry["path"] = json!(op.path);
            }
            categories.entry(tool.category()).or_default().push(entry);
        }
        json!({
            "total_tools": self.tools.len(),
            "categories": categories,
        })
    }
}

fn describe_origin(tool: &ToolDefinition) -> String {
    tool.operation().map_or_else(
        || format!("custom tool {}", tool.name),
        |op| format!("{} {}", op.method, op.path),
    )
}

/// Lazily built, process-wide tool catalog
pub struct ToolCatalog {
    source: Arc<dyn SpecSource>,
    filter: EndpointFilter,
    custom: Vec<ToolDefinition>,
    snapshot: Mutex<Option<Arc<CatalogSnapshot>>>,
    builds: AtomicUsize,
}

impl ToolCatalog {
    /// Catalog over a spec source; nothing is loaded until first use
    pub fn new(source: Arc<dyn SpecSource>, filter: EndpointFilter) -> Self {
        Self {
            source,
            filter,
            custom: Vec::new(),
            snapshot: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Add hand-written tool definitions
    #[must_use]
    pub fn with_custom_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.custom.extend(tools);
        self
    }

    /// Current snapshot, building it on first use
    ///
    /// The first call reads and compiles the document synchronously while
    /// holding the lock, and concurrent callers block until it finishes.
    /// Servers call [`crate::dispatcher::Dispatcher::warm_catalog`] before
    /// accepting requests so this never happens on an async worker.
    ///
    /// # Errors
    ///
    /// Returns the load or naming error of a failed build. Nothing is cached on
    /// failure, so the next call retries.
    pub fn get(&self) -> Result<Arc<CatalogSnapshot>> {
        let mut guard = self.snapshot.lock();
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let spec = self.source.load().map_err(|e| {
            warn!(source = %self.source.describe(), error = %e, "Tool catalog build failed");
            e
        })?;
        let snapshot = Arc::new(CatalogSnapshot::build(&spec, &self.filter, &self.custom)?);
        self.builds.fetch_add(1, Ordering::SeqCst);

        info!(
            count = snapshot.len(),
            custom = self.custom.len(),
            source = %self.source.describe(),
            "Tool catalog built"
        );

        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Discard the snapshot; the next [`ToolCatalog::get`] rebuilds it
    pub fn invalidate(&self) {
        if self.snapshot.lock().take().is_some() {
            info!("Tool catalog invalidated");
        }
    }

    /// Number of successful builds so far
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}
