//! Harvested records and their identity

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the display name used for record identity by default
pub const DEFAULT_IDENTITY_FIELD: &str = "source_name";

/// One harvested item for a unit
///
/// A record is a free-form JSON object. At minimum it carries a display name
/// under the configured identity field; every other field is auxiliary and
/// preserved verbatim. Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Create a record from a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Create a record from an arbitrary JSON value
    ///
    /// # Errors
    /// Returns error if `value` is not a JSON object
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(format!("Record is not a JSON object: {}", kind_of(&other))),
        }
    }

    /// Display name stored under `identity_field`, if it is a string
    pub fn display_name(&self, identity_field: &str) -> Option<&str> {
        self.fields.get(identity_field).and_then(Value::as_str)
    }

    /// Normalized identity key derived from the display name
    ///
    /// A record without a string display name normalizes to the empty key.
    pub fn identity(&self, identity_field: &str) -> String {
        normalize_identity(self.display_name(identity_field).unwrap_or_default())
    }

    /// Look up an auxiliary field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields of the record
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Normalize a display name into an identity key
///
/// Case-folds the name and then drops every character that is not
/// alphanumeric or an underscore. The function is total and deterministic, so
/// keys are stable across batches and across restarts.
pub fn normalize_identity(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
