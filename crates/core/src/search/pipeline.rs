//! Chunked scoring followed by filter, sort and truncation.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::scoring::score_item;
use crate::Error;
use crate::index::IndexEntry;

/// Items scored between cooperative yields.
pub const CHUNK_SIZE: usize = 50;

/// Upper bound on returned results.
pub const MAX_RESULTS: usize = 100;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Relevance,
    Date,
    Title,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortOrder::Relevance),
            "date" => Ok(SortOrder::Date),
            "title" => Ok(SortOrder::Title),
            other => Err(Error::InvalidInput(format!("unknown sort order: {other}"))),
        }
    }
}

/// The three boolean filter toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Posts,
    Tags,
    Categories,
}

/// Session-scoped search filters.
///
/// `tags` and `categories` are exposed as toggles but are reserved: they do
/// not affect results. Only `posts` gates the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchFilters {
    pub posts: bool,
    pub tags: bool,
    pub categories: bool,
    pub sort_order: SortOrder,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self { posts: true, tags: true, categories: true, sort_order: SortOrder::Relevance }
    }
}

impl SearchFilters {
    pub fn set(&mut self, kind: FilterKind, enabled: bool) {
        match kind {
            FilterKind::Posts => self.posts = enabled,
            FilterKind::Tags => self.tags = enabled,
            FilterKind::Categories => self.categories = enabled,
        }
    }

    /// Label shown next to the filter toggle, empty when all filters are on.
    pub fn active_label(&self) -> String {
        let off = [self.posts, self.tags, self.categories].iter().filter(|on| !**on).count();
        if off == 0 { String::new() } else { format!("{}/3 フィルター有効", 3 - off) }
    }
}

/// An accepted item with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredItem {
    pub entry: IndexEntry,
    pub score: i64,
}

/// Score `entries` in batches of `chunk_size`, yielding to the runtime
/// between batches. Keeps only non-negative scores, in index order.
pub async fn score_in_chunks(entries: &[IndexEntry], query: &str, chunk_size: usize) -> Vec<ScoredItem> {
    let mut results = Vec::new();
    let mut chunks = entries.chunks(chunk_size.max(1)).peekable();

    while let Some(chunk) = chunks.next() {
        results.extend(chunk.iter().filter_map(|entry| {
            let score = score_item(entry, query);
            (score >= 0).then(|| ScoredItem { entry: entry.clone(), score })
        }));

        if chunks.peek().is_some() {
            tokio::task::yield_now().await;
        }
    }

    results
}

/// Drop everything when posts are disabled; otherwise pass through.
pub fn apply_filters(items: Vec<ScoredItem>, filters: &SearchFilters) -> Vec<ScoredItem> {
    if !filters.posts {
        return Vec::new();
    }
    items
}

/// Stable sort per `order`.
pub fn apply_sorting(items: &mut [ScoredItem], order: SortOrder) {
    match order {
        SortOrder::Date => {
            items.sort_by_key(|item| std::cmp::Reverse(date_millis(item.entry.date.as_deref())));
        }
        SortOrder::Title => items.sort_by(|a, b| locale_cmp(&a.entry.title, &b.entry.title)),
        SortOrder::Relevance => items.sort_by(|a, b| b.score.cmp(&a.score)),
    }
}

/// Run filter, sort and truncation over scored items.
pub fn finish(items: Vec<ScoredItem>, filters: &SearchFilters, max_results: usize) -> Vec<ScoredItem> {
    let mut items = apply_filters(items, filters);
    apply_sorting(&mut items, filters.sort_order);
    items.truncate(max_results);
    items
}

/// Milliseconds since the epoch; missing or unparsable dates count as 0.
pub fn date_millis(date: Option<&str>) -> i64 {
    let Some(raw) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return 0;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return dt.and_utc().timestamp_millis();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().timestamp_millis();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Case-insensitive ordering with a case-sensitive tie break.
///
/// Approximates a browser's `localeCompare`: both sides are lowercased and
/// compared by code point, so there is no locale collation (accents and kana
/// sort by code point). Strings that differ only in case put the lowercase
/// form first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::entry;

    fn scored(permalink: &str, title: &str, date: Option<&str>, score: i64) -> ScoredItem {
        let mut e = entry(permalink, title, "", Some(""));
        e.date = date.map(str::to_string);
        ScoredItem { entry: e, score }
    }

    fn permalinks(items: &[ScoredItem]) -> Vec<&str> {
        items.iter().map(|i| i.entry.permalink.as_str()).collect()
    }

    #[tokio::test]
    async fn test_score_in_chunks_keeps_order_and_matches() {
        let entries: Vec<IndexEntry> = (0..120)
            .map(|i| {
                let title = if i % 2 == 0 { format!("cats {i}") } else { format!("dogs {i}") };
                entry(&format!("/posts/{i}/"), &title, "", Some(""))
            })
            .collect();

        let results = score_in_chunks(&entries, "cats", 50).await;
        assert_eq!(results.len(), 60);
        assert!(results.iter().all(|r| r.score >= 0));
        assert_eq!(results[0].entry.permalink, "/posts/0/");
        assert_eq!(results[59].entry.permalink, "/posts/118/");
    }

    #[tokio::test]
    async fn test_score_in_chunks_empty_index() {
        assert!(score_in_chunks(&[], "cats", CHUNK_SIZE).await.is_empty());
    }

    #[test]
    fn test_posts_filter_off_drops_everything() {
        let items = vec![scored("/posts/a/", "A", None, 10)];
        let filters = SearchFilters { posts: false, ..Default::default() };
        assert!(apply_filters(items, &filters).is_empty());
    }

    #[test]
    fn test_tags_and_categories_filters_are_inert() {
        let items = vec![scored("/posts/a/", "A", None, 10), scored("/posts/b/", "B", None, 5)];
        let filters = SearchFilters { tags: false, categories: false, ..Default::default() };
        assert_eq!(apply_filters(items.clone(), &filters), items);
    }

    #[test]
    fn test_sort_relevance_descending() {
        let mut items = vec![scored("/a", "A", None, 10), scored("/b", "B", None, 90), scored("/c", "C", None, 50)];
        apply_sorting(&mut items, SortOrder::Relevance);
        assert_eq!(permalinks(&items), vec!["/b", "/c", "/a"]);
    }

    #[test]
    fn test_sort_date_descending_undated_last() {
        let mut items = vec![
            scored("/old", "A", Some("2020-01-01"), 0),
            scored("/none", "B", None, 0),
            scored("/new", "C", Some("2024-05-01T10:00:00+09:00"), 0),
        ];
        apply_sorting(&mut items, SortOrder::Date);
        assert_eq!(permalinks(&items), vec!["/new", "/old", "/none"]);
    }

    #[test]
    fn test_sort_title_ascending_case_insensitive() {
        let mut items = vec![
            scored("/b", "banana", None, 0),
            scored("/a", "Apple", None, 0),
            scored("/c", "cherry", None, 0),
        ];
        apply_sorting(&mut items, SortOrder::Title);
        assert_eq!(permalinks(&items), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_locale_cmp_folds_case_then_breaks_ties() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Zebra", "apple"), Ordering::Greater);
        assert_eq!(locale_cmp("apple", "Apple"), Ordering::Less);
        assert_eq!(locale_cmp("Apple", "Apple"), Ordering::Equal);
    }

    #[test]
    fn test_finish_truncates() {
        let items: Vec<_> = (0..150).map(|i| scored(&format!("/{i}"), "t", None, i)).collect();
        let done = finish(items, &SearchFilters::default(), MAX_RESULTS);
        assert_eq!(done.len(), 100);
        assert_eq!(done[0].score, 149);
    }

    #[test]
    fn test_date_millis_formats() {
        assert_eq!(date_millis(None), 0);
        assert_eq!(date_millis(Some("garbage")), 0);
        assert_eq!(date_millis(Some("1970-01-02")), 86_400_000);
        assert_eq!(date_millis(Some("1970-01-01T00:00:01Z")), 1_000);
        assert_eq!(date_millis(Some("1970-01-01T00:00:02")), 2_000);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("date".parse::<SortOrder>().unwrap(), SortOrder::Date);
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_active_label() {
        let mut filters = SearchFilters::default();
        assert_eq!(filters.active_label(), "");
        filters.set(FilterKind::Tags, false);
        assert_eq!(filters.active_label(), "2/3 フィルター有効");
        filters.set(FilterKind::Posts, false);
        assert_eq!(filters.active_label(), "1/3 フィルター有効");
    }
}
