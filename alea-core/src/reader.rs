//! Cached read path used by public pages.
//!
//! Each page section asks for one content block by key. Results are kept for
//! a stale time so a page render does not hit the backend once per section.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::builder::SaveOutcome;
use crate::models::DraftEntry;
use crate::store::ContentStore;

/// Default time a fetched block is considered fresh.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

struct CachedEntry {
    entry: Option<DraftEntry>,
    fetched_at: Instant,
}

/// Reads merged content blocks by key, with a per-key cache.
pub struct SiteContentReader<S> {
    store: S,
    stale_after: Duration,
    cache: HashMap<String, CachedEntry>,
}

impl<S: ContentStore> SiteContentReader<S> {
    pub fn new(store: S) -> Self {
        Self::with_stale_after(store, DEFAULT_STALE_AFTER)
    }

    pub fn with_stale_after(store: S, stale_after: Duration) -> Self {
        Self {
            store,
            stale_after,
            cache: HashMap::new(),
        }
    }

    /// Returns the merged block for `key`, or `None` if it does not exist.
    ///
    /// Read errors are logged and reported as `None` so the caller falls back
    /// to its built-in copy. Errors are not cached.
    pub async fn get(&mut self, key: &str) -> Option<DraftEntry> {
        if let Some(cached) = self.cache.get(key) {
            if cached.fetched_at.elapsed() < self.stale_after {
                debug!(key, "site content cache hit");
                return cached.entry.clone();
            }
        }

        match self.store.select_by_key(key).await {
            Ok(record) => {
                let entry = record.map(|r| r.to_draft());
                self.cache.insert(
                    key.to_string(),
                    CachedEntry {
                        entry: entry.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                entry
            }
            Err(e) => {
                warn!(key, error = %e, "error fetching site content");
                None
            }
        }
    }

    pub fn invalidate(&mut self, key: &str) {
        self.cache.remove(key);
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Drops the blocks a page builder save wrote.
    pub fn invalidate_saved(&mut self, outcome: &SaveOutcome) {
        if !outcome.wrote_anything() {
            return;
        }
        for key in outcome.saved_keys() {
            self.invalidate(key);
        }
        debug!(count = outcome.saved_count(), "site content cache invalidated");
    }
}
