use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Editable, flattened view of one content block.
///
/// Holds the block's `key` plus every field the editor can touch: the flat
/// columns and whatever extra fields live in the record's payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftEntry(Map<String, Value>);

impl DraftEntry {
    /// Creates an entry that only carries its key.
    pub fn new(key: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("key".to_string(), Value::String(key.into()));
        Self(fields)
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a field as text when it holds a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for DraftEntry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
