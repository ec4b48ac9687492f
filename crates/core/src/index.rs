//! Content index model, merge rules and the in-memory index cache.
//!
//! The site publishes several JSON collections describing its content. They
//! are merged into one ordered sequence: restricted to the posts section,
//! de-duplicated by permalink (first occurrence wins) and normalized so that
//! every entry carries `content`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

/// Path segment marking posts content.
pub const POSTS_SECTION: &str = "/posts/";

/// One searchable content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IndexEntry {
    pub permalink: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Full text. `None` only before normalization.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl IndexEntry {
    /// Full text, or the empty string for a not-yet-normalized entry.
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Supplier of raw index collections.
///
/// Implementations must be fault tolerant: a source that fails or answers
/// with a non-success status contributes an empty collection.
#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn fetch_sources(&self) -> Vec<Vec<IndexEntry>>;
}

/// Merge raw collections into the searchable index.
///
/// Applies, in order: the section filter, permalink de-duplication keeping
/// the first occurrence, and the `content` backfill from `summary`.
pub fn merge_index(sources: Vec<Vec<IndexEntry>>, section: &str) -> Vec<IndexEntry> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .flatten()
        .filter(|entry| entry.permalink.contains(section))
        .filter(|entry| seen.insert(entry.permalink.clone()))
        .map(|mut entry| {
            if entry.content.is_none() {
                entry.content = Some(entry.summary.clone());
            }
            entry
        })
        .collect()
}

/// Process-lifetime cache of the merged index.
pub struct IndexCache {
    section: String,
    entries: RwLock<Option<Arc<Vec<IndexEntry>>>>,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(POSTS_SECTION)
    }
}

impl IndexCache {
    pub fn new(section: impl Into<String>) -> Self {
        Self { section: section.into(), entries: RwLock::new(None) }
    }

    /// Return the cached index, fetching and merging it on a miss.
    ///
    /// A cached index whose entries all lack `content` predates the current
    /// schema and is refetched. Never fails: unavailable sources produce an
    /// empty index.
    pub async fn fetch_index(&self, source: &dyn IndexSource, force: bool) -> Arc<Vec<IndexEntry>> {
        if !force {
            let cached = self.entries.read().await;
            if let Some(entries) = cached.as_ref() {
                if !is_outdated(entries) {
                    return Arc::clone(entries);
                }
                tracing::info!(count = entries.len(), "cached index predates content field, refetching");
            }
        }

        let merged = Arc::new(merge_index(source.fetch_sources().await, &self.section));
        tracing::debug!(count = merged.len(), "content index loaded");

        *self.entries.write().await = Some(Arc::clone(&merged));
        merged
    }

    /// Fetch and merge the sources again and report whether the result
    /// differs from the cached index. The cache itself is left untouched;
    /// nothing counts as an update before the first load.
    pub async fn has_update(&self, source: &dyn IndexSource) -> bool {
        let Some(current) = self.entries.read().await.as_ref().map(Arc::clone) else {
            return false;
        };
        let fresh = merge_index(source.fetch_sources().await, &self.section);
        let changed = *current != fresh;
        tracing::debug!(current = current.len(), fresh = fresh.len(), changed, "checked content index for updates");
        changed
    }

    #[cfg(test)]
    pub(crate) async fn seed(&self, entries: Vec<IndexEntry>) {
        *self.entries.write().await = Some(Arc::new(entries));
    }

    pub async fn len(&self) -> Option<usize> {
        self.entries.read().await.as_ref().map(|e| e.len())
    }
}

fn is_outdated(entries: &[IndexEntry]) -> bool {
    !entries.is_empty() && entries.iter().all(|e| e.content.is_none())
}
