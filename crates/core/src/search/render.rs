//! Result and history markup.
//!
//! Every interpolated value goes through [`escape_html`]; highlighting finds
//! query terms in the raw text and escapes the pieces around each `<mark>`,
//! so markup can never be injected through titles, excerpts or the query.

use regex::{Regex, RegexBuilder};

use super::SearchHit;
use super::excerpt::MatchKind;

pub const NO_RESULTS_HTML: &str = "<p>該当する結果がありません。</p>";

/// Escape `& < > " '` for text and attribute positions.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whitespace-delimited query terms, de-duplicated case-insensitively.
pub fn query_terms(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split_whitespace()
        .filter(|term| seen.insert(term.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn highlight_class(kind: Option<MatchKind>) -> &'static str {
    match kind {
        Some(MatchKind::Title) => "hl-title",
        Some(MatchKind::Taxonomy) => "hl-taxonomy",
        _ => "hl",
    }
}

fn terms_pattern(raw: &str) -> Option<Regex> {
    let terms = query_terms(raw);
    if terms.is_empty() {
        return None;
    }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

/// Escape `text` and wrap every query term occurrence in `<mark>`.
///
/// `kind` selects the highlight class; `None` uses the default class.
pub fn highlight(text: &str, raw_query: &str, kind: Option<MatchKind>) -> String {
    let Some(pattern) = terms_pattern(raw_query) else {
        return escape_html(text);
    };
    let class = highlight_class(kind);

    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;
    for m in pattern.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(&format!(r#"<mark class="{class}">{}</mark>"#, escape_html(m.as_str())));
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Badge naming the field that matched.
pub fn match_badge(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Title => r#"<span class="match-badge match-title">タイトル</span>"#,
        MatchKind::Summary => r#"<span class="match-badge match-summary">概要</span>"#,
        MatchKind::Content => r#"<span class="match-badge match-content">本文</span>"#,
        MatchKind::Taxonomy => r#"<span class="match-badge match-taxonomy">タグ</span>"#,
    }
}

/// Count label shown above the results.
pub fn count_label(count: usize) -> String {
    format!("{count}件")
}

/// Markup for a single result.
pub fn render_hit(hit: &SearchHit, raw_query: &str, cover_fallback: &str) -> String {
    let title = highlight(&hit.title, raw_query, Some(MatchKind::Title));
    let excerpt = highlight(&hit.best_match.text, raw_query, Some(hit.best_match.kind));
    let cover = hit.cover.as_deref().filter(|c| !c.is_empty()).unwrap_or(cover_fallback);
    let date = hit
        .date
        .as_deref()
        .map(|d| format!(r#"<div class="result-meta">{}</div>"#, escape_html(d)))
        .unwrap_or_default();

    format!(
        concat!(
            r#"<a class="result" href="{href}">"#,
            r#"<img class="result-cover" src="{cover}" alt="{alt}" loading="lazy" decoding="async">"#,
            r#"<div class="result-content">"#,
            r#"<div class="result-title">{title}{badge}</div>"#,
            "{date}",
            r#"<div class="result-summary">{excerpt}</div>"#,
            "</div></a>"
        ),
        href = escape_html(&hit.permalink),
        cover = escape_html(cover),
        alt = escape_html(&hit.title),
        title = title,
        badge = match_badge(hit.best_match.kind),
        date = date,
        excerpt = excerpt,
    )
}

/// Markup for the results list; the empty list renders a notice.
pub fn render_results(hits: &[SearchHit], raw_query: &str, cover_fallback: &str) -> String {
    if hits.is_empty() {
        return NO_RESULTS_HTML.to_string();
    }
    hits.iter().map(|hit| render_hit(hit, raw_query, cover_fallback)).collect()
}

/// Markup for the history list, or `None` when the list should be hidden.
pub fn render_history(entries: &[String]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let html = entries
        .iter()
        .map(|query| {
            let q = escape_html(query);
            format!(
                r#"<div class="sm-history-item" data-query="{q}"><span>{q}</span><button class="sm-history-remove" data-query="{q}" aria-label="削除">×</button></div>"#
            )
        })
        .collect();
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::excerpt::BestMatch;

    fn hit(title: &str, excerpt: &str, kind: MatchKind) -> SearchHit {
        SearchHit {
            permalink: "/posts/a/".into(),
            title: title.into(),
            date: None,
            cover: None,
            score: 100,
            best_match: BestMatch { text: excerpt.into(), kind, weight: 60 },
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("日本語"), "日本語");
    }

    #[test]
    fn test_query_terms_dedup_case_insensitive() {
        assert_eq!(query_terms("  Cats dogs  cats DOGS x "), vec!["Cats", "dogs", "x"]);
        assert!(query_terms("   ").is_empty());
    }

    #[test]
    fn test_highlight_all_terms() {
        let out = highlight("Cats and dogs and CATS", "cats dogs", None);
        assert_eq!(
            out,
            r#"<mark class="hl">Cats</mark> and <mark class="hl">dogs</mark> and <mark class="hl">CATS</mark>"#
        );
    }

    #[test]
    fn test_highlight_class_per_kind() {
        assert!(highlight("Cats", "cats", Some(MatchKind::Title)).contains("hl-title"));
        assert!(highlight("Cats", "cats", Some(MatchKind::Taxonomy)).contains("hl-taxonomy"));
        assert!(highlight("Cats", "cats", Some(MatchKind::Content)).contains(r#"class="hl""#));
    }

    #[test]
    fn test_highlight_escapes_text_and_query() {
        let out = highlight("<b>cats</b> & <script>", "<script>", None);
        assert_eq!(out, r#"&lt;b&gt;cats&lt;/b&gt; &amp; <mark class="hl">&lt;script&gt;</mark>"#);
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn test_highlight_regex_metacharacters() {
        let out = highlight("c++ (v2.0)", "c++ (v2.0)", None);
        assert_eq!(out, r#"<mark class="hl">c++</mark> <mark class="hl">(v2.0)</mark>"#);
    }

    #[test]
    fn test_highlight_empty_query() {
        assert_eq!(highlight("a & b", "   ", None), "a &amp; b");
    }

    #[test]
    fn test_render_hit_uses_default_cover_and_badge() {
        let html = render_hit(&hit("Cats Everywhere", "Cats Everywhere", MatchKind::Title), "cats", "/img/d.svg");
        assert!(html.starts_with(r#"<a class="result" href="/posts/a/">"#));
        assert!(html.contains(r#"src="/img/d.svg""#));
        assert!(html.contains("match-title"));
        assert!(html.contains(r#"<mark class="hl-title">Cats</mark> Everywhere"#));
        assert!(!html.contains("result-meta"));
    }

    #[test]
    fn test_render_hit_escapes_attributes() {
        let mut h = hit(r#""><script>x</script>"#, "body", MatchKind::Summary);
        h.cover = Some(r#"/img/a.png" onerror="x"#.into());
        h.date = Some("2024-01-01".into());
        let html = render_hit(&h, "zz", "/img/d.svg");
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"src="/img/a.png&quot; onerror=&quot;x""#));
        assert!(html.contains(r#"<div class="result-meta">2024-01-01</div>"#));
        assert!(html.contains("match-summary"));
    }

    #[test]
    fn test_render_results_empty() {
        assert_eq!(render_results(&[], "cats", "/img/d.svg"), NO_RESULTS_HTML);
        assert_eq!(count_label(0), "0件");
    }

    #[test]
    fn test_render_history() {
        assert!(render_history(&[]).is_none());
        let html = render_history(&["a<b".to_string()]).unwrap();
        assert!(html.contains(r#"data-query="a&lt;b""#));
        assert!(html.contains("<span>a&lt;b</span>"));
    }
}
