//! Client-side full-text search over the content index.
//!
//! This module provides:
//! - Positional scoring of index entries ([`scoring`])
//! - Best-match excerpt selection ([`excerpt`])
//! - Chunked scoring, filtering and sorting ([`pipeline`])
//! - Escaped result and history markup ([`render`])
//! - Persistent search history ([`history`])
//! - The modal session with debounce and stale-result guarding ([`session`])

pub mod excerpt;
pub mod history;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::index::IndexEntry;

pub use excerpt::{BestMatch, MatchKind, PunctuationSegmenter, Segmenter, find_best_match};
pub use history::SearchHistory;
pub use pipeline::{FilterKind, ScoredItem, SearchFilters, SortOrder};
pub use scoring::{normalize, score_item};
pub use session::{ModalView, SearchSession, SearchSettings};

/// A ranked result ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchHit {
    pub permalink: String,
    pub title: String,
    pub date: Option<String>,
    pub cover: Option<String>,
    pub score: i64,
    pub best_match: BestMatch,
}

impl SearchHit {
    pub fn new(item: ScoredItem, query: &str, segmenter: &dyn Segmenter) -> Self {
        let best_match = find_best_match(&item.entry, query, segmenter);
        let IndexEntry { permalink, title, date, cover, .. } = item.entry;
        Self { permalink, title, date, cover, score: item.score, best_match }
    }
}

/// Result of one completed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchOutcome {
    /// Sequence number the search ran under.
    pub seq: u64,
    /// Raw query as typed.
    pub query: String,
    pub hits: Vec<SearchHit>,
    /// Rendered result list; empty when results were cleared.
    pub html: String,
    /// Empty when results were cleared.
    pub count_label: String,
    pub history_recorded: bool,
}

impl SearchOutcome {
    /// Outcome for a query below the minimum length: nothing shown.
    pub fn cleared(seq: u64, query: String) -> Self {
        Self { seq, query, hits: Vec::new(), html: String::new(), count_label: String::new(), history_recorded: false }
    }
}
