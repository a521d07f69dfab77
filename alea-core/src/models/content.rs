use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::draft::DraftEntry;

/// Flat text columns of the `site_content` table, in column order.
pub const FLAT_FIELDS: [&str; 8] = [
    "title",
    "subtitle",
    "text",
    "image_url",
    "number",
    "label",
    "author",
    "role",
];

/// Row columns that never become part of a draft entry.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "content"];

/// One row of the `site_content` table.
///
/// Store-managed columns such as `id` and `created_at` are ignored on read
/// and never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub key: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
    /// Left out of the body when unset so the column default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = match content {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    /// Value of a flat column by name.
    pub fn flat_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "title" => &self.title,
            "subtitle" => &self.subtitle,
            "text" => &self.text,
            "image_url" => &self.image_url,
            "number" => &self.number,
            "label" => &self.label,
            "author" => &self.author,
            "role" => &self.role,
            _ => return None,
        };
        value.as_deref()
    }

    fn flat_field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "subtitle" => Some(&mut self.subtitle),
            "text" => Some(&mut self.text),
            "image_url" => Some(&mut self.image_url),
            "number" => Some(&mut self.number),
            "label" => Some(&mut self.label),
            "author" => Some(&mut self.author),
            "role" => Some(&mut self.role),
            _ => None,
        }
    }

    /// Builds the editable view of this record.
    ///
    /// Payload fields are merged over the flat columns and win on conflict.
    /// Null columns are skipped and reserved names are dropped from both
    /// sides so saving never nests a payload inside a payload.
    pub fn to_draft(&self) -> DraftEntry {
        let mut fields = Map::new();
        fields.insert("key".to_string(), Value::String(self.key.clone()));

        for name in FLAT_FIELDS {
            if let Some(value) = self.flat_field(name) {
                fields.insert(name.to_string(), Value::String(value.to_string()));
            }
        }

        if let Some(payload) = &self.content {
            for (name, value) in payload {
                if RESERVED_FIELDS.contains(&name.as_str()) {
                    continue;
                }
                fields.insert(name.clone(), value.clone());
            }
        }

        DraftEntry::from_map(fields)
    }

    /// Normalizes a draft entry back into a writable row.
    ///
    /// `key` is the draft-state key. Every flat column is present: missing,
    /// null, empty, zero and `false` values become `None`, other numbers and
    /// `true` are written as text. The whole entry is also kept as the payload so fields outside
    /// the flat set survive a round trip.
    pub fn from_draft(key: &str, entry: &DraftEntry, updated_at: DateTime<Utc>) -> Self {
        let mut record = ContentRecord::new(key);

        for name in FLAT_FIELDS {
            let text = entry.get(name).and_then(column_text);
            if let Some(slot) = record.flat_field_mut(name) {
                *slot = text;
            }
        }

        record.updated_at = Some(updated_at);
        record.content = Some(entry.as_map().clone());
        record
    }
}

/// Blank values (the same ones `field_or` falls back on) are written as NULL.
fn column_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Accepts text columns that the backend hands back as numbers or booleans.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
