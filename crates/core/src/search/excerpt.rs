//! Best-match excerpt selection for display.
//!
//! Independent of the numeric score: fields are tried in a fixed priority
//! order and the first one containing the query supplies the excerpt and the
//! badge shown next to the result.

use serde::{Deserialize, Serialize};

use super::scoring::{char_find, normalize};
use crate::index::IndexEntry;

/// Characters kept before the hit in a content excerpt.
const CONTEXT_BEFORE: usize = 75;

/// Characters kept after the end of the hit in a content excerpt.
const CONTEXT_AFTER: usize = 150;

/// A boundary must fall within this many characters of the excerpt edge to
/// be used for trimming.
const BOUNDARY_WINDOW: usize = 30;

const ELLIPSIS: &str = "...";

/// Which field produced the displayed excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Title,
    Summary,
    Content,
    Taxonomy,
}

/// Excerpt chosen for a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BestMatch {
    pub text: String,
    pub kind: MatchKind,
    /// Display priority of the match (100 title ... 20 fallback).
    pub weight: u8,
}

/// Sentence-boundary detection used to trim content excerpts.
pub trait Segmenter: Send + Sync {
    /// Offset of the first sentence terminator in `text`.
    fn first_boundary(&self, text: &[char]) -> Option<usize>;

    /// Offset of the last terminator that may end an excerpt.
    fn last_boundary(&self, text: &[char]) -> Option<usize>;
}

/// Punctuation-set heuristic covering Japanese and ASCII sentence endings.
#[derive(Debug, Clone)]
pub struct PunctuationSegmenter {
    terminators: Vec<char>,
    closers: Vec<char>,
}

impl Default for PunctuationSegmenter {
    fn default() -> Self {
        Self { terminators: vec!['。', '！', '？', '.', '!', '?'], closers: vec!['。'] }
    }
}

impl PunctuationSegmenter {
    pub fn new(terminators: Vec<char>, closers: Vec<char>) -> Self {
        Self { terminators, closers }
    }
}

impl Segmenter for PunctuationSegmenter {
    fn first_boundary(&self, text: &[char]) -> Option<usize> {
        text.iter().position(|c| self.terminators.contains(c))
    }

    fn last_boundary(&self, text: &[char]) -> Option<usize> {
        text.iter().rposition(|c| self.closers.contains(c))
    }
}

/// Pick the excerpt to display for `entry` given a normalized query.
pub fn find_best_match(entry: &IndexEntry, query: &str, segmenter: &dyn Segmenter) -> BestMatch {
    if normalize(&entry.title).contains(query) {
        return BestMatch { text: entry.title.clone(), kind: MatchKind::Title, weight: 100 };
    }
    if normalize(&entry.summary).contains(query) {
        return BestMatch { text: entry.summary.clone(), kind: MatchKind::Summary, weight: 80 };
    }
    if let Some(text) = content_excerpt(entry.content(), query, segmenter) {
        return BestMatch { text, kind: MatchKind::Content, weight: 60 };
    }

    let tags = normalize(&entry.tags.join(" "));
    let categories = normalize(&entry.categories.join(" "));
    if tags.contains(query) || categories.contains(query) {
        let text = if entry.summary.is_empty() { entry.title.clone() } else { entry.summary.clone() };
        return BestMatch { text, kind: MatchKind::Taxonomy, weight: 40 };
    }

    BestMatch { text: entry.summary.clone(), kind: MatchKind::Summary, weight: 20 }
}

/// Window of `content` around the first hit, trimmed to sentence boundaries.
fn content_excerpt(content: &str, query: &str, segmenter: &dyn Segmenter) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let hit = char_find(&normalize(content), query)?;

    let chars: Vec<char> = content.chars().collect();
    let query_len = query.chars().count();
    let start = hit.saturating_sub(CONTEXT_BEFORE).min(chars.len());
    let end = (hit + query_len + CONTEXT_AFTER).min(chars.len());
    let mut window = &chars[start..end];
    let mut prefix = "";
    let mut suffix = "";

    if start > 0 {
        match segmenter.first_boundary(window) {
            Some(b) if b > 0 && b < BOUNDARY_WINDOW => window = &window[b + 1..],
            _ => prefix = ELLIPSIS,
        }
    }

    if end < chars.len() {
        match segmenter.last_boundary(window) {
            Some(b) if b > 0 && b + BOUNDARY_WINDOW > window.len() => window = &window[..=b],
            _ => suffix = ELLIPSIS,
        }
    }

    let body: String = window.iter().collect();
    Some(format!("{prefix}{body}{suffix}"))
}
