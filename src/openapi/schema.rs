//! Flat tool input schemas
//!
//! Every field records where its value travels in the HTTP request. Body fields
//! are always named `body_<property>` (or `body` for a whole non-object
//! payload), so they can never shadow a path or query parameter.

use serde_json::{Map, Value, json};

/// Prefix marking request-body fields
pub const BODY_PREFIX: &str = "body_";

/// Field carrying a whole non-object request body
pub const RAW_BODY_FIELD: &str = "body";

/// Where an argument is placed in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Substituted into the path template
    Path,
    /// Sent as a query-string parameter
    Query,
    /// Placed in the JSON body
    Body,
}

/// JSON Schema type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// string
    String,
    /// integer
    Integer,
    /// number
    Number,
    /// boolean
    Boolean,
    /// array
    Array,
    /// object
    Object,
    /// no type constraint
    Any,
}

impl FieldType {
    /// Read the `type` keyword of a schema; missing, unknown or union types are `Any`
    #[must_use]
    pub fn from_schema(schema: Option<&Value>) -> Self {
        match schema.and_then(|s| s.get("type")).and_then(Value::as_str) {
            Some("string") => Self::String,
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("array") => Self::Array,
            Some("object") => Self::Object,
            _ => Self::Any,
        }
    }

    /// JSON Schema `type` value, `None` for [`FieldType::Any`]
    #[must_use]
    pub fn json_type(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// Where a field's value goes, with its wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Path placeholder
    Path(&'a str),
    /// Query-string key
    Query(&'a str),
    /// Key inside an object body
    BodyKey(&'a str),
    /// The whole body
    WholeBody,
    /// Handed to a custom handler untouched
    Unrouted,
}

/// One input field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Argument name as seen by callers
    pub name: String,
    /// Value type
    pub field_type: FieldType,
    /// Whether callers must supply it
    pub required: bool,
    /// Request placement; `None` for custom tool arguments
    pub provenance: Option<Provenance>,
    /// Description
    pub description: Option<String>,
}

impl FieldSpec {
    /// Required path placeholder
    pub fn path(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            provenance: Some(Provenance::Path),
            description: None,
        }
    }

    /// Query parameter
    pub fn query(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            provenance: Some(Provenance::Query),
            description: None,
        }
    }

    /// Body property `property`, exposed as `body_<property>`
    pub fn body(property: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            name: format!("{BODY_PREFIX}{property}"),
            field_type,
            required,
            provenance: Some(Provenance::Body),
            description: None,
        }
    }

    /// Whole-payload body field
    #[must_use]
    pub fn raw_body(field_type: FieldType, required: bool) -> Self {
        Self {
            name: RAW_BODY_FIELD.to_string(),
            field_type,
            required,
            provenance: Some(Provenance::Body),
            description: None,
        }
    }

    /// Argument consumed by a custom handler
    pub fn argument(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            provenance: None,
            description: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Placement of this field in the outgoing request
    #[must_use]
    pub fn route(&self) -> Route<'_> {
        match self.provenance {
            Some(Provenance::Path) => Route::Path(&self.name),
            Some(Provenance::Query) => Route::Query(&self.name),
            Some(Provenance::Body) => match self.name.strip_prefix(BODY_PREFIX) {
                Some(key) => Route::BodyKey(key),
                None => Route::WholeBody,
            },
            None => Route::Unrouted,
        }
    }

    fn to_json(&self) -> Value {
        let mut prop = Map::new();
        if let Some(ty) = self.field_type.json_type() {
            prop.insert("type".to_string(), Value::String(ty.to_string()));
        }
        let description = self.description.clone().unwrap_or_else(|| match self.route() {
            Route::Path(_) => format!("{} path parameter", self.name),
            Route::Query(_) => format!("{} query parameter", self.name),
            Route::BodyKey(key) => format!("{key} in request body"),
            Route::WholeBody => "Request body".to_string(),
            Route::Unrouted => self.name.clone(),
        });
        prop.insert("description".to_string(), Value::String(description));
        Value::Object(prop)
    }
}

/// Ordered, name-unique set of input fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    /// Empty schema (tool takes no arguments)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InputSchema::push`]
    #[must_use]
    pub fn with(mut self, field: FieldSpec) -> Self {
        self.push(field);
        self
    }

    /// Add a field; returns `false` (and keeps the existing one) on a name clash
    pub fn push(&mut self, field: FieldSpec) -> bool {
        if self.field(&field.name).is_some() {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Look up a field by argument name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields with the given provenance
    pub fn with_provenance(&self, provenance: Provenance) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |f| f.provenance == Some(provenance))
    }

    /// Names of required fields
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a JSON Schema object
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json()))
            .collect();
        let required: Vec<&str> = self.required().collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_type_from_schema() {
        let t = |v: Value| FieldType::from_schema(Some(&v));
        assert_eq!(t(json!({"type": "integer"})), FieldType::Integer);
        assert_eq!(t(json!({"type": "array", "items": {}})), FieldType::Array);
        assert_eq!(t(json!({"type": ["string", "null"]})), FieldType::Any);
        assert_eq!(t(json!({"format": "date-time"})), FieldType::Any);
        assert_eq!(FieldType::from_schema(None), FieldType::Any);
    }

    #[test]
    fn routes_follow_naming_convention() {
        assert_eq!(
            FieldSpec::path("name", FieldType::String).route(),
            Route::Path("name")
        );
        assert_eq!(
            FieldSpec::query("limit", FieldType::Integer, false).route(),
            Route::Query("limit")
        );
        assert_eq!(
            FieldSpec::body("name", FieldType::String, true).route(),
            Route::BodyKey("name")
        );
        assert_eq!(
            FieldSpec::raw_body(FieldType::Array, true).route(),
            Route::WholeBody
        );
        assert_eq!(
            FieldSpec::argument("tagPath", FieldType::String, true).route(),
            Route::Unrouted
        );
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut schema = InputSchema::new();
        assert!(schema.push(FieldSpec::path("name", FieldType::String)));
        assert!(!schema.push(FieldSpec::query("name", FieldType::Integer, false)));
        assert_eq!(schema.len(), 1);
        assert_eq!(
            schema.field("name").unwrap().provenance,
            Some(Provenance::Path)
        );
    }

    #[test]
    fn renders_json_schema() {
        let schema = InputSchema::new()
            .with(FieldSpec::path("name", FieldType::String).describe("Project name"))
            .with(FieldSpec::query("verbose", FieldType::Boolean, false))
            .with(FieldSpec::body("config", FieldType::Any, true));

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Project name"},
                    "verbose": {"type": "boolean", "description": "verbose query parameter"},
                    "body_config": {"description": "config in request body"}
                },
                "required": ["name", "body_config"],
                "additionalProperties": false
            })
        );
    }
}
