//! Endpoint selection

use super::Operation;
use crate::transport::HttpMethod;

/// Resource families exposed by default
pub const DEFAULT_INCLUDE_PREFIXES: &[&str] = &[
    "/data/api/v1/projects",
    "/data/api/v1/tags",
    "/data/api/v1/devices",
    "/data/api/v1/modules",
    "/data/api/v1/activation",
    "/data/api/v1/backup",
    "/data/api/v1/logs",
    "/system/gateway",
];

/// Decides which operations become tools
#[derive(Debug, Clone)]
pub struct EndpointFilter {
    prefixes: Vec<String>,
    read_only: bool,
}

impl EndpointFilter {
    /// Filter with an explicit allow-list; an empty list selects the defaults
    #[must_use]
    pub fn new(prefixes: &[String]) -> Self {
        if prefixes.is_empty() {
            return Self::default();
        }
        Self {
            prefixes: prefixes.to_vec(),
            read_only: false,
        }
    }

    /// Only expose GET operations
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Whether the operation is exposed
    ///
    /// Prefixes match textually, so `/system/gateway` also admits
    /// `/system/gateway-network/...`.
    #[must_use]
    pub fn include(&self, path: &str, method: HttpMethod, operation: &Operation) -> bool {
        if self.read_only && method != HttpMethod::Get {
            return false;
        }
        !operation.deprecated && self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Active allow-list
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for EndpointFilter {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_INCLUDE_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            read_only: false,
        }
    }
}
