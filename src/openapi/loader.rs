//! Spec sources - where the API description comes from

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use super::OpenApiSpec;
use crate::{Error, Result};

/// Producer of a parsed API description
///
/// Loading is synchronous: the catalog calls it once under its build guard.
pub trait SpecSource: Send + Sync {
    /// Load and parse the document
    fn load(&self) -> Result<OpenApiSpec>;

    /// Human-readable origin, for logs and error messages
    fn describe(&self) -> String;
}

/// Spec stored on disk (JSON or YAML)
#[derive(Debug, Clone)]
pub struct FileSpecSource {
    path: PathBuf,
}

impl FileSpecSource {
    /// Read the spec from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SpecSource for FileSpecSource {
    fn load(&self) -> Result<OpenApiSpec> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::SpecLoad(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let spec = OpenApiSpec::parse_str(&content)?;
        info!(
            path = %self.path.display(),
            title = %spec.info.title,
            version = %spec.version(),
            paths = spec.paths.len(),
            "Loaded OpenAPI spec"
        );
        Ok(spec)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Spec already held in memory (fetched from the gateway, or embedded in tests)
#[derive(Debug, Clone)]
pub struct StaticSpecSource {
    document: Value,
}

impl StaticSpecSource {
    /// Wrap a parsed JSON document
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

impl SpecSource for StaticSpecSource {
    fn load(&self) -> Result<OpenApiSpec> {
        OpenApiSpec::from_value(self.document.clone())
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}
