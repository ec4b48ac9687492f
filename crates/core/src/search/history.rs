//! Bounded, most-recent-first search history.
//!
//! The list is persisted as a JSON array under a single storage key. Storage
//! failures are logged and swallowed; the in-memory list keeps working.

use std::sync::Arc;

use crate::cache::KeyValueStore;

/// Storage key holding the history array.
pub const HISTORY_KEY: &str = "karuta-search-history";

/// Default number of remembered queries.
pub const MAX_HISTORY: usize = 10;

/// Default minimum query length (in characters) worth remembering.
pub const MIN_HISTORY_LEN: usize = 2;

pub struct SearchHistory {
    store: Option<Arc<dyn KeyValueStore>>,
    entries: Vec<String>,
    capacity: usize,
    min_len: usize,
}

impl SearchHistory {
    /// Non-persistent history.
    pub fn in_memory(capacity: usize, min_len: usize) -> Self {
        Self { store: None, entries: Vec::new(), capacity, min_len }
    }

    /// Load the persisted history. Unreadable or malformed data yields an
    /// empty list.
    pub async fn load(store: Arc<dyn KeyValueStore>, capacity: usize, min_len: usize) -> Self {
        let entries = match store.get_item(HISTORY_KEY).await {
            Ok(Some(json)) => serde_json::from_str::<Vec<String>>(&json).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "discarding malformed search history");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "search history unavailable, continuing in memory");
                Vec::new()
            }
        };
        let mut history = Self { store: Some(store), entries, capacity, min_len };
        history.entries.truncate(capacity);
        history
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `query` to the front, evicting the oldest entry past capacity.
    ///
    /// Returns false (and changes nothing) for queries shorter than the
    /// minimum length. Matching is exact and case-sensitive.
    pub async fn add(&mut self, query: &str) -> bool {
        if query.chars().count() < self.min_len {
            return false;
        }
        self.entries.retain(|q| q != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.capacity);
        self.persist().await;
        true
    }

    pub async fn remove(&mut self, query: &str) {
        self.entries.retain(|q| q != query);
        self.persist().await;
    }

    pub async fn clear(&mut self) {
        self.entries.clear();
        if let Some(store) = &self.store
            && let Err(e) = store.remove_item(HISTORY_KEY).await
        {
            tracing::warn!(error = %e, "failed to clear persisted search history");
        }
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match serde_json::to_string(&self.entries) {
            Ok(json) => store.set_item(HISTORY_KEY, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist search history");
        }
    }
}
