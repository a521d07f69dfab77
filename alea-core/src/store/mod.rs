//! Backend boundaries.
//!
//! The site keeps its editable copy in a `site_content` table and its images
//! in object storage buckets. Both are reached through the traits below so
//! the page builder works the same against the hosted backend and a local
//! one.

mod objects;
mod rest;

use thiserror::Error;

use crate::models::ContentRecord;

pub use objects::{content_type_for, random_object_name};
pub use rest::BackendClient;

/// Name of the content table on the backend.
pub const CONTENT_TABLE: &str = "site_content";

/// Errors returned by content and object stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("{message} (status {status})")]
    Backend { status: u16, message: String },
    #[error("Content key already exists: {0}")]
    Duplicate(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid data: {0}")]
    Decode(String),
}

/// Table-like access to site content records.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// Fetches every record.
    async fn select_all(&self) -> Result<Vec<ContentRecord>, StoreError>;

    /// Fetches the record with the given key, if any.
    async fn select_by_key(&self, key: &str) -> Result<Option<ContentRecord>, StoreError>;

    /// Inserts the record, or replaces the row that already has its key.
    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError>;

    /// Inserts the record; fails with [`StoreError::Duplicate`] if the key exists.
    async fn insert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError>;

    /// Deletes the record with the given key. Returns whether a row was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    async fn select_all(&self) -> Result<Vec<ContentRecord>, StoreError> {
        (**self).select_all().await
    }

    async fn select_by_key(&self, key: &str) -> Result<Option<ContentRecord>, StoreError> {
        (**self).select_by_key(key).await
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        (**self).upsert(record).await
    }

    async fn insert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        (**self).insert(record).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }
}

/// Bucketed blob storage with public URLs.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Uploads `bytes` to `bucket/path`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Public URL of an object. Does not check that the object exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

impl<O: ObjectStore + ?Sized> ObjectStore for &O {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        (**self).upload(bucket, path, bytes, content_type).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        (**self).public_url(bucket, path)
    }
}
