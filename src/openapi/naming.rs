//! Tool name derivation and collision handling
//!
//! Names come from the operation id when it normalizes to a valid identifier,
//! otherwise from the method and path. Collisions are resolved by appending the
//! method, then a running counter. Because operations are always visited in the
//! same order, the same document yields the same names on every run.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::transport::HttpMethod;
use crate::{Error, Result};

/// Longest tool name handed to callers
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Highest counter tried before reporting a collision
const MAX_COUNTER_SUFFIX: usize = 999;

/// Path segments that carry no meaning in a tool name
const SKIPPED_SEGMENTS: &[&str] = &["data", "api", "v1"];

fn identifier_re() -> &'static Regex {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    IDENT_RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"))
}

/// Collapse `_` runs and trim them from both ends
fn squash_underscores(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push(c);
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out.trim_matches('_').to_string()
}

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect::<String>().trim_end_matches('_').to_string()
}

/// Normalize an operation id: `getProject-ByName` -> `get_project_by_name`
///
/// Returns `None` when the result is not a valid identifier.
#[must_use]
pub fn normalize_operation_id(operation_id: &str) -> Option<String> {
    let mut snake = String::with_capacity(operation_id.len() + 8);
    let mut prev_lower_or_digit = false;
    for c in operation_id.chars() {
        match c {
            '-' | ' ' | '.' => {
                snake.push('_');
                prev_lower_or_digit = false;
            }
            c if c.is_ascii_uppercase() => {
                if prev_lower_or_digit {
                    snake.push('_');
                }
                snake.push(c.to_ascii_lowercase());
                prev_lower_or_digit = false;
            }
            c => {
                snake.push(c);
                prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        }
    }

    let name = truncate(&squash_underscores(&snake), MAX_TOOL_NAME_LEN);
    identifier_re().is_match(&name).then_some(name)
}

/// Derive a name from method and path: `GET /data/api/v1/projects/{name}` -> `get_projects_name`
#[must_use]
pub fn name_from_path(path: &str, method: HttpMethod) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && !SKIPPED_SEGMENTS.contains(s))
        .map(|s| {
            s.chars()
                .filter(|c| *c != '{' && *c != '}')
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_lowercase()
                    } else {
                        '_'
                    }
                })
                .collect()
        })
        .collect();

    let raw = if segments.is_empty() {
        method.lower().to_string()
    } else {
        format!("{}_{}", method.lower(), segments.join("_"))
    };
    truncate(&squash_underscores(&raw), MAX_TOOL_NAME_LEN)
}

/// Preferred name before collision handling
#[must_use]
pub fn base_name(path: &str, method: HttpMethod, operation_id: Option<&str>) -> String {
    operation_id
        .and_then(normalize_operation_id)
        .unwrap_or_else(|| name_from_path(path, method))
}

fn with_suffix(base: &str, suffix: &str) -> String {
    let room = MAX_TOOL_NAME_LEN.saturating_sub(suffix.len() + 1);
    format!("{}_{suffix}", truncate(base, room))
}

/// Assigns unique tool names across one catalog build
#[derive(Debug, Default)]
pub struct NameResolver {
    /// name -> "METHOD path" of the operation holding it
    assigned: HashMap<String, String>,
}

impl NameResolver {
    /// Create an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a unique name for an operation
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameCollision`] when every candidate is taken.
    pub fn resolve(
        &mut self,
        path: &str,
        method: HttpMethod,
        operation_id: Option<&str>,
    ) -> Result<String> {
        let label = format!("{method} {path}");
        let base = base_name(path, method, operation_id);

        let candidates = std::iter::once(base.clone())
            .chain(std::iter::once(with_suffix(&base, method.lower())))
            .chain((2..=MAX_COUNTER_SUFFIX).map(|n| with_suffix(&base, &n.to_string())));

        for candidate in candidates {
            if !self.assigned.contains_key(&candidate) {
                self.assigned.insert(candidate.clone(), label);
                return Ok(candidate);
            }
        }

        Err(Error::NameCollision {
            first: self.assigned.get(&base).cloned().unwrap_or_default(),
            name: base,
            second: label,
        })
    }

    /// Number of names handed out
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether no names were handed out yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
