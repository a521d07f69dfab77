//! In-memory stores for tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::models::ContentRecord;
use crate::store::{ContentStore, ObjectStore, StoreError};

/// Content table held in memory, with scripted failures.
#[derive(Default)]
pub struct MemoryStore {
    rows: RefCell<BTreeMap<String, ContentRecord>>,
    failing_keys: RefCell<HashMap<String, String>>,
    failing_select: RefCell<Option<String>>,
    upserts: RefCell<Vec<ContentRecord>>,
    selects: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ContentRecord>) -> Self {
        let store = Self::new();
        for row in rows {
            store.rows.borrow_mut().insert(row.key.clone(), row);
        }
        store
    }

    /// Makes every upsert of `key` fail with `message`.
    pub fn fail_upserts_for(&self, key: &str, message: &str) {
        self.failing_keys
            .borrow_mut()
            .insert(key.to_string(), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_keys.borrow_mut().clear();
    }

    /// Makes reads fail with `message`.
    pub fn fail_selects(&self, message: &str) {
        *self.failing_select.borrow_mut() = Some(message.to_string());
    }

    pub fn row(&self, key: &str) -> Option<ContentRecord> {
        self.rows.borrow().get(key).cloned()
    }

    pub fn upserts(&self) -> Vec<ContentRecord> {
        self.upserts.borrow().clone()
    }

    pub fn select_count(&self) -> usize {
        self.selects.get()
    }

    fn check_select(&self) -> Result<(), StoreError> {
        self.selects.set(self.selects.get() + 1);
        match self.failing_select.borrow().as_ref() {
            Some(message) => Err(StoreError::Http(message.clone())),
            None => Ok(()),
        }
    }
}

impl ContentStore for MemoryStore {
    async fn select_all(&self) -> Result<Vec<ContentRecord>, StoreError> {
        self.check_select()?;
        Ok(self.rows.borrow().values().cloned().collect())
    }

    async fn select_by_key(&self, key: &str) -> Result<Option<ContentRecord>, StoreError> {
        self.check_select()?;
        Ok(self.row(key))
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        self.upserts.borrow_mut().push(record.clone());
        if let Some(message) = self.failing_keys.borrow().get(&record.key) {
            return Err(StoreError::Backend {
                status: 400,
                message: message.clone(),
            });
        }
        self.rows
            .borrow_mut()
            .insert(record.key.clone(), record.clone());
        Ok(record.clone())
    }

    async fn insert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        if self.rows.borrow().contains_key(&record.key) {
            return Err(StoreError::Duplicate(record.key.clone()));
        }
        self.rows
            .borrow_mut()
            .insert(record.key.clone(), record.clone());
        Ok(record.clone())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.rows.borrow_mut().remove(key).is_some())
    }
}

/// Object store that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryObjects {
    objects: RefCell<BTreeMap<String, Vec<u8>>>,
    failing: Cell<bool>,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self) {
        self.failing.set(true);
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }
}

impl ObjectStore for MemoryObjects {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        if self.failing.get() {
            return Err(StoreError::Backend {
                status: 413,
                message: "Payload too large".to_string(),
            });
        }
        self.objects
            .borrow_mut()
            .insert(format!("{}/{}", bucket, path), bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }
}
