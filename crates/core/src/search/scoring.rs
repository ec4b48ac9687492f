//! Positional relevance scoring.
//!
//! An item's score depends only on where the query first appears in a
//! synthetic concatenation of its fields: earlier hits score higher, and a
//! title that starts with the query earns a small bonus. There is no
//! per-field weighting beyond field order.

use crate::index::IndexEntry;

/// Base score of a hit at offset 0.
pub const POSITION_BASE: i64 = 100;

/// Bonus for a title starting with the query.
pub const TITLE_PREFIX_BONUS: i64 = 5;

/// Score of a non-matching item. Anything negative is rejected.
pub const NO_MATCH: i64 = -1;

/// Lowercase a query or field for matching.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// Lowercased concatenation of title, summary, content, description, tags
/// and categories, space-joined.
pub fn haystack(entry: &IndexEntry) -> String {
    let fields = [
        entry.title.as_str(),
        entry.summary.as_str(),
        entry.content(),
        entry.description.as_str(),
        &entry.tags.join(" "),
        &entry.categories.join(" "),
    ];
    normalize(&fields.join(" "))
}

/// Character offset of the first occurrence of `needle` in `hay`.
pub(crate) fn char_find(hay: &str, needle: &str) -> Option<usize> {
    hay.find(needle).map(|byte| hay[..byte].chars().count())
}

/// Score `entry` against an already-normalized query.
///
/// Returns 0 for an empty query, [`NO_MATCH`] when the query does not occur,
/// and `100 - offset (+5)` otherwise. Hits beyond offset 100 floor at 0 so
/// that every occurrence stays a non-negative match.
///
/// Offsets count `char`s of the case-folded haystack. A browser counts UTF-16
/// code units instead, so text with characters outside the BMP (emoji) before
/// the hit scores slightly higher here. Case folding uses `to_lowercase`, which
/// can change the length of a few characters and shift the offset with it.
pub fn score_item(entry: &IndexEntry, query: &str) -> i64 {
    if query.is_empty() {
        return 0;
    }
    let Some(offset) = char_find(&haystack(entry), query) else {
        return NO_MATCH;
    };
    let bonus = if normalize(&entry.title).starts_with(query) { TITLE_PREFIX_BONUS } else { 0 };
    (POSITION_BASE - offset as i64).max(0) + bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::entry;

    #[test]
    fn test_empty_query_scores_zero() {
        assert_eq!(score_item(&entry("/posts/a/", "Anything", "", None), ""), 0);
    }

    #[test]
    fn test_no_match_is_negative() {
        let e = entry("/posts/a/", "Hello", "World", Some("body"));
        assert_eq!(score_item(&e, "cats"), NO_MATCH);
    }

    #[test]
    fn test_title_prefix_bonus() {
        let e = entry("/posts/a/", "Cats Everywhere", "", Some(""));
        assert_eq!(score_item(&e, "cats"), 100 + 5);
    }

    #[test]
    fn test_title_match_without_prefix() {
        let e = entry("/posts/a/", "My Cats", "", Some(""));
        assert_eq!(score_item(&e, "cats"), 100 - 3);
    }

    #[test]
    fn test_earlier_offset_scores_higher() {
        let early = entry("/posts/a/", "x", "cats here", Some(""));
        let late = entry("/posts/b/", "x", "many words before cats", Some(""));
        assert!(score_item(&early, "cats") > score_item(&late, "cats"));
    }

    #[test]
    fn test_matches_taxonomy_fields() {
        let mut e = entry("/posts/a/", "Title", "", Some(""));
        e.tags = vec!["Rust".into(), "WebAssembly".into()];
        e.categories = vec!["Programming".into()];
        assert!(score_item(&e, "webassembly") >= 0);
        assert!(score_item(&e, "programming") >= 0);
        assert!(score_item(&e, "rust webassembly") >= 0);
    }

    #[test]
    fn test_match_spanning_field_boundary() {
        let e = entry("/posts/a/", "hello", "world", Some(""));
        assert_eq!(score_item(&e, "hello world"), 100);
    }

    #[test]
    fn test_offsets_count_characters() {
        let e = entry("/posts/a/", "日本語の記事", "", Some(""));
        assert_eq!(score_item(&e, "記事"), 100 - 4);
    }

    #[test]
    fn test_astral_characters_count_once() {
        let e = entry("/posts/a/", "🎉 cats", "", Some(""));
        assert_eq!(score_item(&e, "cats"), 100 - 2);
    }

    #[test]
    fn test_far_match_floors_at_zero() {
        let long = "a".repeat(150);
        let e = entry("/posts/a/", "t", "", Some(&format!("{long} cats")));
        assert_eq!(score_item(&e, "cats"), 0);
    }

    #[test]
    fn test_haystack_field_order() {
        let mut e = entry("/posts/a/", "T", "S", Some("C"));
        e.description = "D".into();
        e.tags = vec!["x".into(), "y".into()];
        e.categories = vec!["z".into()];
        assert_eq!(haystack(&e), "t s c d x y z");
    }
}
