//! Dirty detection between draft state and the pristine snapshot.

use std::fmt;

use serde_json::{Map, Value};

use crate::models::DraftEntry;

/// Classification of one content key against the pristine snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    /// In the draft state but not in the snapshot.
    New,
    /// In both, with different contents.
    Modified,
    /// In both, structurally equal.
    Unchanged,
    /// In the snapshot only.
    Removed,
}

impl ContentStatus {
    /// Whether the key needs to be written on save.
    pub fn needs_save(self) -> bool {
        matches!(self, ContentStatus::New | ContentStatus::Modified)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::New => write!(f, "new"),
            ContentStatus::Modified => write!(f, "modified"),
            ContentStatus::Unchanged => write!(f, "unchanged"),
            ContentStatus::Removed => write!(f, "removed"),
        }
    }
}

/// Classifies a key from its draft and pristine versions.
pub fn classify(
    draft: Option<&DraftEntry>,
    pristine: Option<&DraftEntry>,
) -> Option<ContentStatus> {
    match (draft, pristine) {
        (Some(_), None) => Some(ContentStatus::New),
        (None, Some(_)) => Some(ContentStatus::Removed),
        (Some(d), Some(p)) if entries_equivalent(d, p) => Some(ContentStatus::Unchanged),
        (Some(_), Some(_)) => Some(ContentStatus::Modified),
        (None, None) => None,
    }
}

pub fn entries_equivalent(a: &DraftEntry, b: &DraftEntry) -> bool {
    maps_equivalent(a.as_map(), b.as_map())
}

/// Structural equality for JSON values.
///
/// Object comparison ignores key order, and a field holding `null` equals a
/// missing field at every depth. Numbers compare by value so `1` and `1.0`
/// are the same. Arrays stay order-sensitive.
pub fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => maps_equivalent(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equivalent(l, r))
        }
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn maps_equivalent(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.keys().chain(b.keys()).all(|field| {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        values_equivalent(left, right)
    })
}
