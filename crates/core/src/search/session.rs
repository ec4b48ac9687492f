//! Search modal session.
//!
//! Owns everything the modal mutates: the cached index, filters, the latest
//! raw query and the history. Each search is tagged with a monotonically
//! increasing sequence number; a completion whose number is no longer the
//! latest is dropped instead of rendered.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::excerpt::{PunctuationSegmenter, Segmenter};
use super::history::SearchHistory;
use super::pipeline::{self, FilterKind, SearchFilters, SortOrder};
use super::render;
use super::scoring::normalize;
use super::{SearchHit, SearchOutcome};
use crate::config::{AppConfig, DEFAULT_COVER};
use crate::index::{IndexCache, IndexSource, POSTS_SECTION};

/// Tunables of a session, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub chunk_size: usize,
    pub max_results: usize,
    pub min_query_len: usize,
    pub cover_fallback: String,
    pub section: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            chunk_size: pipeline::CHUNK_SIZE,
            max_results: pipeline::MAX_RESULTS,
            min_query_len: 2,
            cover_fallback: DEFAULT_COVER.to_string(),
            section: POSTS_SECTION.to_string(),
        }
    }
}

impl From<&AppConfig> for SearchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            debounce: config.debounce(),
            chunk_size: config.chunk_size,
            max_results: config.max_results,
            min_query_len: config.min_query_len,
            cover_fallback: config.cover_fallback().to_string(),
            ..Default::default()
        }
    }
}

/// What the modal shows when opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ModalView {
    History { entries: Vec<String>, html: String },
    Results,
}

pub struct SearchSession {
    settings: SearchSettings,
    source: Arc<dyn IndexSource>,
    index: IndexCache,
    segmenter: Arc<dyn Segmenter>,
    filters: RwLock<SearchFilters>,
    history: Mutex<SearchHistory>,
    latest_query: RwLock<String>,
    seq: AtomicU64,
}

impl SearchSession {
    pub fn new(settings: SearchSettings, source: Arc<dyn IndexSource>, history: SearchHistory) -> Self {
        let index = IndexCache::new(settings.section.clone());
        Self {
            settings,
            source,
            index,
            segmenter: Arc::new(PunctuationSegmenter::default()),
            filters: RwLock::new(SearchFilters::default()),
            history: Mutex::new(history),
            latest_query: RwLock::new(String::new()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn index(&self) -> &IndexCache {
        &self.index
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Show history when there is no active query and history exists.
    pub async fn open(&self) -> ModalView {
        if self.has_active_query().await {
            return ModalView::Results;
        }
        let history = self.history.lock().await;
        match render::render_history(history.entries()) {
            Some(html) => ModalView::History { entries: history.entries().to_vec(), html },
            None => ModalView::Results,
        }
    }

    /// Close the modal. In-flight searches complete as stale.
    pub fn close(&self) {
        self.next_seq();
    }

    /// Keystroke input: debounced, does not record history.
    ///
    /// Returns `None` when a newer input or search superseded this one.
    pub async fn input(&self, raw: &str) -> Option<SearchOutcome> {
        *self.latest_query.write().await = raw.to_string();
        let seq = self.next_seq();

        tokio::time::sleep(self.settings.debounce).await;
        if !self.is_current(seq) {
            tracing::trace!(seq, "debounced input superseded");
            return None;
        }
        self.run_search(seq, false).await
    }

    /// Enter / form submission: record the latest query, never navigate.
    pub async fn submit(&self) -> bool {
        let raw = self.latest_query.read().await.clone();
        if raw.chars().count() < self.settings.min_query_len {
            return false;
        }
        self.history.lock().await.add(&raw).await
    }

    /// Run `raw` immediately and record it in history.
    pub async fn search(&self, raw: &str) -> Option<SearchOutcome> {
        self.search_with(raw, true).await
    }

    /// Run `raw` immediately, skipping the debounce.
    pub async fn search_with(&self, raw: &str, record: bool) -> Option<SearchOutcome> {
        *self.latest_query.write().await = raw.to_string();
        let seq = self.next_seq();
        self.run_search(seq, record).await
    }

    /// Re-run a query picked from the history list.
    pub async fn select_history(&self, query: &str) -> Option<SearchOutcome> {
        self.search(query).await
    }

    /// Toggle a filter, re-running the active query if there is one.
    pub async fn set_filter(&self, kind: FilterKind, enabled: bool) -> Option<SearchOutcome> {
        self.filters.write().await.set(kind, enabled);
        self.rerun().await
    }

    pub async fn set_sort_order(&self, order: SortOrder) -> Option<SearchOutcome> {
        self.filters.write().await.sort_order = order;
        self.rerun().await
    }

    /// Replace filters and sort order without re-running anything.
    pub async fn replace_filters(&self, filters: SearchFilters) {
        *self.filters.write().await = filters;
    }

    pub async fn filters(&self) -> SearchFilters {
        *self.filters.read().await
    }

    pub async fn active_filters_label(&self) -> String {
        self.filters.read().await.active_label()
    }

    pub async fn latest_query(&self) -> String {
        self.latest_query.read().await.clone()
    }

    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.entries().to_vec()
    }

    pub async fn add_history(&self, query: &str) -> bool {
        self.history.lock().await.add(query).await
    }

    pub async fn remove_history(&self, query: &str) {
        self.history.lock().await.remove(query).await;
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear().await;
    }

    /// Drop the cached index and fetch it again. Returns the entry count.
    pub async fn refresh_index(&self) -> usize {
        self.index.fetch_index(self.source.as_ref(), true).await.len()
    }

    /// Whether the sources now hold a different index than the one in use.
    pub async fn index_has_update(&self) -> bool {
        self.index.has_update(self.source.as_ref()).await
    }

    async fn rerun(&self) -> Option<SearchOutcome> {
        if !self.has_active_query().await {
            return None;
        }
        let seq = self.next_seq();
        self.run_search(seq, true).await
    }

    async fn has_active_query(&self) -> bool {
        self.latest_query.read().await.chars().count() >= self.settings.min_query_len
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    async fn run_search(&self, seq: u64, record: bool) -> Option<SearchOutcome> {
        let raw = self.latest_query.read().await.clone();
        let query = normalize(&raw);

        if query.chars().count() < self.settings.min_query_len {
            return Some(SearchOutcome::cleared(seq, raw));
        }

        let recorded = if record { self.history.lock().await.add(&raw).await } else { false };

        let entries = self.index.fetch_index(self.source.as_ref(), false).await;
        let scored = pipeline::score_in_chunks(&entries, &query, self.settings.chunk_size).await;

        if !self.is_current(seq) {
            tracing::debug!(seq, "dropping stale search completion");
            return None;
        }

        let filters = *self.filters.read().await;
        let hits: Vec<SearchHit> = pipeline::finish(scored, &filters, self.settings.max_results)
            .into_iter()
            .map(|item| SearchHit::new(item, &query, self.segmenter.as_ref()))
            .collect();

        tracing::debug!(seq, query = %raw, count = hits.len(), "search completed");

        let html = render::render_results(&hits, &raw, &self.settings.cover_fallback);
        Some(SearchOutcome {
            seq,
            count_label: render::count_label(hits.len()),
            query: raw,
            hits,
            html,
            history_recorded: recorded,
        })
    }
}
