//! Content index fetcher.
//!
//! Fetches the posts index and the site-wide index concurrently, each with a
//! cache-busting `v` parameter. A source that fails, answers with a
//! non-success status or is not a JSON array contributes an empty
//! collection; malformed items inside an array are skipped individually.
//!
//! Fetches go through whatever [`Network`] the fetcher is given. The server
//! hands it the cache controller, so index loads are routed and cached like
//! any other page request.

use std::sync::Arc;

use async_trait::async_trait;
use karuta_core::Error;
use karuta_core::index::{IndexEntry, IndexSource};
use karuta_core::worker::{CACHE_BUST_PARAM, Network, RequestInfo};
use reqwest::Url;

use crate::fetch::resolve;

/// Posts-specific index.
pub const POSTS_INDEX: &str = "/posts/index.json";

/// Site-wide index.
pub const SITE_INDEX: &str = "/index.json";

pub struct IndexFetcher {
    network: Arc<dyn Network>,
    origin: Url,
}

impl IndexFetcher {
    pub fn new(network: Arc<dyn Network>, origin: Url) -> Self {
        Self { network, origin }
    }

    fn source_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = resolve(&self.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &chrono::Utc::now().timestamp_millis().to_string());
        Ok(url)
    }

    async fn fetch_source(&self, path: &str) -> Result<Vec<IndexEntry>, Error> {
        let req = RequestInfo::get(self.source_url(path)?).with_accept("application/json");
        let resp = self.network.fetch(&req).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Error::IndexFetch(format!("{path}: status {}", resp.status)));
        }
        parse_entries(&resp.body)
    }

    /// Fetch one source, degrading every failure to an empty collection.
    async fn fetch_lenient(&self, path: &str) -> Vec<IndexEntry> {
        match self.fetch_source(path).await {
            Ok(entries) => {
                tracing::debug!(source = path, count = entries.len(), "index source loaded");
                entries
            }
            Err(e) => {
                tracing::warn!(source = path, error = %e, "index source unavailable");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl IndexSource for IndexFetcher {
    async fn fetch_sources(&self) -> Vec<Vec<IndexEntry>> {
        let (posts, site) = tokio::join!(self.fetch_lenient(POSTS_INDEX), self.fetch_lenient(SITE_INDEX));
        vec![posts, site]
    }
}

/// Decode an index document: a JSON array of entries.
///
/// Items that are not valid entries are dropped with a debug log.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<IndexEntry>, Error> {
    let items: Vec<serde_json::Value> =
        serde_json::from_slice(bytes).map_err(|e| Error::IndexFetch(format!("not a JSON array: {e}")))?;

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<IndexEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed index item");
                None
            }
        })
        .collect())
}
