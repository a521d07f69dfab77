//! HTTP client for the hosted backend.
//!
//! Talks to the backend's REST table API (PostgREST dialect) for the
//! `site_content` table and to its storage API for image buckets. Every
//! request carries the API key both as `apikey` and as a bearer token.

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use super::{ContentStore, ObjectStore, StoreError, CONTENT_TABLE};
use crate::models::ContentRecord;

/// Error body returned by the table and storage APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Maps a failed response to a store error.
///
/// Prefers the body's `message`, then `error`, then the raw text.
fn error_from_body(status: u16, text: String) -> StoreError {
    let body: Option<ErrorBody> = serde_json::from_str(&text).ok();

    // 23505 is Postgres' unique_violation
    let duplicate = body.as_ref().and_then(|b| b.code.as_deref()) == Some("23505");

    let message = body
        .and_then(|b| {
            b.message
                .filter(|m| !m.is_empty())
                .or(b.error.filter(|e| !e.is_empty()))
        })
        .unwrap_or_else(|| {
            if text.is_empty() {
                format!("Backend returned status {}", status)
            } else {
                text
            }
        });

    if duplicate {
        return StoreError::Duplicate(message);
    }
    StoreError::Backend { status, message }
}

/// Client for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl BackendClient {
    /// Creates a new client with explicit parameters.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the backend URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Builds an HTTP URL for a given path.
    fn build_http_url(&self, path: &str) -> String {
        let base_url = if !self.base_url.starts_with("http://")
            && !self.base_url.starts_with("https://")
        {
            format!("https://{}", self.base_url)
        } else {
            self.base_url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    /// URL of the content table, with an optional query string.
    fn table_url(&self, query: &str) -> String {
        let path = format!("/rest/v1/{}", CONTENT_TABLE);
        if query.is_empty() {
            self.build_http_url(&path)
        } else {
            self.build_http_url(&format!("{}?{}", path, query))
        }
    }

    fn key_filter(key: &str) -> String {
        format!("key=eq.{}", urlencoding::encode(key))
    }

    fn object_path(bucket: &str, path: &str) -> String {
        let path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", urlencoding::encode(bucket), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(error_from_body(status, text))
    }

    async fn rows(response: Response) -> Result<Vec<ContentRecord>, StoreError> {
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn write(
        &self,
        record: &ContentRecord,
        query: &str,
        prefer: &str,
    ) -> Result<ContentRecord, StoreError> {
        let request = self
            .http
            .post(self.table_url(query))
            .header("Prefer", prefer)
            .json(record);

        let rows = Self::rows(self.send(request).await?).await?;
        Ok(rows.into_iter().next().unwrap_or_else(|| record.clone()))
    }
}

impl ContentStore for BackendClient {
    async fn select_all(&self) -> Result<Vec<ContentRecord>, StoreError> {
        let request = self.http.get(self.table_url("select=*"));
        Self::rows(self.send(request).await?).await
    }

    async fn select_by_key(&self, key: &str) -> Result<Option<ContentRecord>, StoreError> {
        let query = format!("select=*&{}&limit=1", Self::key_filter(key));
        let request = self.http.get(self.table_url(&query));
        let rows = Self::rows(self.send(request).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        self.write(
            record,
            "on_conflict=key",
            "resolution=merge-duplicates,return=representation",
        )
        .await
    }

    async fn insert(&self, record: &ContentRecord) -> Result<ContentRecord, StoreError> {
        self.write(record, "", "return=representation")
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::Duplicate(record.key.clone()),
                other => other,
            })
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let request = self
            .http
            .delete(self.table_url(&Self::key_filter(key)))
            .header("Prefer", "return=representation");
        let rows = Self::rows(self.send(request).await?).await?;
        Ok(!rows.is_empty())
    }
}

impl ObjectStore for BackendClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = self.build_http_url(&format!(
            "/storage/v1/object/{}",
            Self::object_path(bucket, path)
        ));
        let request = self
            .http
            .post(url)
            .header("Content-Type", content_type)
            .body(bytes);

        self.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.build_http_url(&format!(
            "/storage/v1/object/public/{}",
            Self::object_path(bucket, path)
        ))
    }
}
