//! Results and errors reported by the page builder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// A single key whose upsert failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFailure {
    pub key: String,
    pub message: String,
}

impl fmt::Display for KeyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// What happened to the snapshot when a batch partly failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Keys that were written are marked clean; failed keys stay dirty.
    #[default]
    PerKey,
    /// The snapshot only moves after a batch with no failures.
    AllOrNothing,
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotPolicy::PerKey => write!(f, "per_key"),
            SnapshotPolicy::AllOrNothing => write!(f, "all_or_nothing"),
        }
    }
}

/// Result of [`PageBuilder::save_all`](super::PageBuilder::save_all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No key was new or modified; nothing was written.
    NothingToSave,
    /// Every dirty key was written.
    Saved { keys: Vec<String> },
    /// At least one upsert failed. `saved` lists the keys that went through.
    PartialFailure {
        saved: Vec<String>,
        failures: Vec<KeyFailure>,
    },
}

impl SaveOutcome {
    pub fn saved_keys(&self) -> &[String] {
        match self {
            SaveOutcome::NothingToSave => &[],
            SaveOutcome::Saved { keys } => keys,
            SaveOutcome::PartialFailure { saved, .. } => saved,
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved_keys().len()
    }

    pub fn failures(&self) -> &[KeyFailure] {
        match self {
            SaveOutcome::PartialFailure { failures, .. } => failures,
            _ => &[],
        }
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures().iter().map(|f| f.key.as_str()).collect()
    }

    /// Aggregate error when any upsert failed.
    pub fn error(&self) -> Option<SaveError> {
        match self {
            SaveOutcome::PartialFailure { failures, .. } => Some(SaveError {
                failures: failures.clone(),
            }),
            _ => None,
        }
    }

    /// Whether remote content changed, so cached reads are stale.
    pub fn wrote_anything(&self) -> bool {
        self.saved_count() > 0
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::NothingToSave => write!(f, "Nothing to save: no changes detected."),
            SaveOutcome::Saved { keys } => write!(f, "{} item(s) saved successfully.", keys.len()),
            SaveOutcome::PartialFailure { saved, failures } => write!(
                f,
                "{} item(s) saved, {} failed.",
                saved.len(),
                failures.len()
            ),
        }
    }
}

/// Aggregate of every failed key in a save batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError {
    pub failures: Vec<KeyFailure>,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Some items could not be saved. {}", details)
    }
}

impl std::error::Error for SaveError {}

/// Errors from page builder operations other than saving.
#[derive(Debug)]
pub enum BuilderError {
    /// Fetching content from the store failed; draft state is empty.
    Load(StoreError),
    /// A reload was refused because these keys have unsaved edits.
    UnsavedChanges(Vec<String>),
    /// Uploading an image failed; the draft is unchanged.
    Upload(StoreError),
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::Load(e) => write!(f, "Failed to load content: {}", e),
            BuilderError::UnsavedChanges(keys) => write!(
                f,
                "Refusing to reload with unsaved changes in: {}",
                keys.join(", ")
            ),
            BuilderError::Upload(e) => write!(f, "Image upload failed: {}", e),
        }
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuilderError::Load(e) | BuilderError::Upload(e) => Some(e),
            BuilderError::UnsavedChanges(_) => None,
        }
    }
}
