//! Page builder content synchronization.
//!
//! The page builder edits every site content block in memory and writes the
//! edited ones back in one batch:
//!
//! 1. [`PageBuilder::load_all`] fetches all records and takes a pristine
//!    snapshot of their draft entries
//! 2. [`PageBuilder::set_field`] edits one field of one key in the draft state
//! 3. [`PageBuilder::status`] and [`PageBuilder::has_unsaved_changes`] compare
//!    the draft state against the snapshot
//! 4. [`PageBuilder::save_all`] upserts every new or modified key, one at a
//!    time, and moves the snapshot forward for what was written
//!
//! Upserts are sequential so each failure is attributed to its key. A failed
//! key never stops the rest of the batch.

mod dirty;
mod outcome;

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{ContentRecord, DraftEntry};
use crate::store::{content_type_for, random_object_name, ContentStore, ObjectStore};

pub use dirty::{classify, entries_equivalent, values_equivalent, ContentStatus};
pub use outcome::{BuilderError, KeyFailure, SaveError, SaveOutcome, SnapshotPolicy};

/// Editing session over the site content table.
pub struct PageBuilder<S> {
    store: S,
    drafts: BTreeMap<String, DraftEntry>,
    pristine: BTreeMap<String, DraftEntry>,
    policy: SnapshotPolicy,
    loading: bool,
}

impl<S: ContentStore> PageBuilder<S> {
    /// Creates an empty session. Call [`load_all`](Self::load_all) to fill it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            drafts: BTreeMap::new(),
            pristine: BTreeMap::new(),
            policy: SnapshotPolicy::default(),
            loading: false,
        }
    }

    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current draft state, keyed by content key.
    pub fn contents(&self) -> &BTreeMap<String, DraftEntry> {
        &self.drafts
    }

    pub fn get(&self, key: &str) -> Option<&DraftEntry> {
        self.drafts.get(key)
    }

    /// Loads every record into the draft state and the snapshot.
    ///
    /// Refuses with [`BuilderError::UnsavedChanges`] while edits are pending so
    /// a reload never silently drops them; use
    /// [`discard_and_reload`](Self::discard_and_reload) to force it.
    /// Returns the number of records loaded.
    pub async fn load_all(&mut self) -> Result<usize, BuilderError> {
        let dirty = self.dirty_keys();
        if !dirty.is_empty() {
            return Err(BuilderError::UnsavedChanges(dirty));
        }
        self.reload().await
    }

    /// Drops local edits and loads every record again.
    pub async fn discard_and_reload(&mut self) -> Result<usize, BuilderError> {
        self.reload().await
    }

    async fn reload(&mut self) -> Result<usize, BuilderError> {
        self.loading = true;
        let result = self.store.select_all().await;
        self.loading = false;

        match result {
            Ok(records) => {
                let drafts: BTreeMap<String, DraftEntry> = records
                    .iter()
                    .map(|record| (record.key.clone(), record.to_draft()))
                    .collect();
                self.pristine = drafts.clone();
                self.drafts = drafts;
                info!(count = self.drafts.len(), "loaded site content");
                Ok(self.drafts.len())
            }
            Err(e) => {
                warn!(error = %e, "failed to load site content");
                self.drafts.clear();
                self.pristine.clear();
                Err(BuilderError::Load(e))
            }
        }
    }

    /// Sets one field of one content block in the draft state.
    ///
    /// Unknown keys become new blocks holding their key and this field.
    pub fn set_field(&mut self, key: &str, field: &str, value: impl Into<Value>) {
        self.drafts
            .entry(key.to_string())
            .or_insert_with(|| DraftEntry::new(key))
            .set(field, value.into());
    }

    /// Display text of a field, or `default` when it is missing or blank.
    ///
    /// `null`, `false`, `0` and empty strings all count as blank.
    pub fn field_or(&self, key: &str, field: &str, default: &str) -> String {
        match self.drafts.get(key).and_then(|entry| entry.get(field)) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Bool(true)) => "true".to_string(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            Some(value @ (Value::Array(_) | Value::Object(_))) => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Classifies a key against the snapshot. `None` if the key is unknown.
    pub fn status(&self, key: &str) -> Option<ContentStatus> {
        classify(self.drafts.get(key), self.pristine.get(key))
    }

    /// Every key that is not unchanged, with its status, in key order.
    pub fn changes(&self) -> Vec<(String, ContentStatus)> {
        let mut keys: Vec<&String> = self.drafts.keys().chain(self.pristine.keys()).collect();
        keys.sort();
        keys.dedup();

        keys.into_iter()
            .filter_map(|key| self.status(key).map(|status| (key.clone(), status)))
            .filter(|(_, status)| *status != ContentStatus::Unchanged)
            .collect()
    }

    fn dirty_keys(&self) -> Vec<String> {
        self.changes().into_iter().map(|(key, _)| key).collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.drafts.len() != self.pristine.len()
            || self.drafts.iter().any(|(key, draft)| {
                self.pristine
                    .get(key)
                    .map_or(true, |pristine| !entries_equivalent(draft, pristine))
            })
    }

    /// Upserts every new or modified block.
    ///
    /// Keys are written one at a time in key order. A failing key is recorded
    /// and the batch continues. On a clean batch the snapshot becomes a copy
    /// of the whole draft state; on a partial failure the configured
    /// [`SnapshotPolicy`] decides what moves.
    pub async fn save_all(&mut self) -> SaveOutcome {
        let pending: Vec<(String, ContentStatus)> = self
            .drafts
            .keys()
            .filter_map(|key| self.status(key).map(|status| (key.clone(), status)))
            .filter(|(_, status)| status.needs_save())
            .collect();

        if pending.is_empty() {
            info!("nothing to save");
            return SaveOutcome::NothingToSave;
        }

        let now = Utc::now();
        let mut saved = Vec::new();
        let mut failures = Vec::new();

        for (key, status) in pending {
            let record = match self.drafts.get(&key) {
                Some(entry) => ContentRecord::from_draft(&key, entry, now),
                None => continue,
            };

            debug!(key = %key, %status, "upserting content");
            match self.store.upsert(&record).await {
                Ok(_) => saved.push(key),
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to save content");
                    failures.push(KeyFailure {
                        key,
                        message: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            self.pristine = self.drafts.clone();
            info!(count = saved.len(), "saved site content");
            return SaveOutcome::Saved { keys: saved };
        }

        if self.policy == SnapshotPolicy::PerKey {
            for key in &saved {
                if let Some(entry) = self.drafts.get(key) {
                    self.pristine.insert(key.clone(), entry.clone());
                }
            }
        }

        warn!(
            saved = saved.len(),
            failed = failures.len(),
            "site content saved with failures"
        );
        SaveOutcome::PartialFailure { saved, failures }
    }

    /// Uploads an image and stores its public URL in `key.field`.
    ///
    /// The object gets a random name that keeps the file's extension. On
    /// failure the draft state is left untouched. Returns the public URL.
    pub async fn upload_image<O: ObjectStore>(
        &mut self,
        objects: &O,
        bucket: &str,
        key: &str,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BuilderError> {
        let path = random_object_name(file_name);
        objects
            .upload(bucket, &path, bytes, content_type_for(file_name))
            .await
            .map_err(BuilderError::Upload)?;

        let url = objects.public_url(bucket, &path);
        debug!(key, field, url = %url, "image uploaded");
        self.set_field(key, field, url.clone());
        Ok(url)
    }
}
