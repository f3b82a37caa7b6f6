use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed map of heterogeneous values backing every record payload.
pub type FieldMap = Map<String, Value>;

/// Categories a record can be tagged with, detected from key presence.
///
/// Detection runs in a fixed priority order; a record carrying several
/// recognized keys tags as the first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Telemetry keyed by a `sensor` field
    Sensor,
    /// User activity keyed by an `action` field
    Activity,
    /// Event batches keyed by a `stream` field
    Stream,
    /// Buy/sell operation batches keyed by a `ledger` field
    Ledger,
}

const CATEGORY_KEYS: [(&str, Category); 4] = [
    ("sensor", Category::Sensor),
    ("action", Category::Activity),
    ("stream", Category::Stream),
    ("ledger", Category::Ledger),
];

impl Category {
    /// Detects the category from whichever recognized key is present.
    pub fn from_fields(fields: &FieldMap) -> Option<Category> {
        CATEGORY_KEYS
            .iter()
            .find(|(key, _)| fields.contains_key(*key))
            .map(|(_, category)| *category)
    }

    /// The key whose presence selects this category.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Sensor => "sensor",
            Category::Activity => "action",
            Category::Stream => "stream",
            Category::Ledger => "ledger",
        }
    }

    /// Format-family label advertised for records of this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Sensor => "JSON-like",
            Category::Activity => "CSV-like",
            Category::Stream => "Stream-like",
            Category::Ledger => "Ledger-like",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The unit of data flowing through a pipeline.
///
/// The payload arrives as arbitrary JSON; only field maps survive the
/// validation stage. Stages never mutate a record in place: each returns a
/// new record built through the `with_*` methods, so the caller's copy is
/// untouched by a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl Record {
    /// Wraps a raw payload into an untagged record.
    pub fn new(payload: Value) -> Self {
        Record {
            payload,
            category: None,
            summary: None,
        }
    }

    /// Builds a record directly from a field map.
    pub fn from_fields(fields: FieldMap) -> Self {
        Record::new(Value::Object(fields))
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The payload as a field map, if it is one.
    pub fn fields(&self) -> Option<&FieldMap> {
        self.payload.as_object()
    }

    /// Looks up a single payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields().and_then(|fields| fields.get(key))
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// New record with one payload field added or replaced.
    ///
    /// A non-map payload is carried over unchanged; shape enforcement is the
    /// validation stage's job, not this builder's.
    pub fn with_field(&self, key: &str, value: Value) -> Record {
        let mut next = self.clone();
        if let Value::Object(ref mut fields) = next.payload {
            fields.insert(key.to_string(), value);
        }
        next
    }

    /// New record carrying the given category tag.
    pub fn with_category(&self, category: Category) -> Record {
        let mut next = self.clone();
        next.category = Some(category);
        next
    }

    /// New record carrying the given rendered summary.
    pub fn with_summary(&self, summary: impl Into<String>) -> Record {
        let mut next = self.clone();
        next.summary = Some(summary.into());
        next
    }
}

/// Short name for a JSON value's shape, used in error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
