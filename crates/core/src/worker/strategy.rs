//! Request classification and the routing strategy table.
//!
//! Everything here is a pure function of request metadata, so routing can be
//! checked without any cache or network.

use serde::{Deserialize, Serialize};
use url::Url;

use super::manifest::{CRITICAL_RESOURCES, CacheKind};

/// Query parameter pages append to defeat HTTP caching; never part of a cache key.
pub const CACHE_BUST_PARAM: &str = "v";

/// Path segments that mark a navigable page.
const DOCUMENT_SEGMENTS: &[&str] = &["/posts/", "/tags/", "/categories/"];

/// What the requester intends to do with the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    #[default]
    #[serde(other)]
    Other,
}

/// Request metadata the controller routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub accept: Option<String>,
}

impl RequestInfo {
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, destination: Destination::Other, accept: None }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Cache key for this request: path plus query, fragment and cache buster dropped.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// Path and query of `url`, the key responses are cached under.
///
/// The `v` cache-busting parameter is removed so a busted fetch still finds
/// the copy stored by the previous one.
pub fn cache_key(url: &Url) -> String {
    let kept: Vec<&str> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(CACHE_BUST_PARAM))
        .collect();
    if kept.is_empty() { url.path().to_string() } else { format!("{}?{}", url.path(), kept.join("&")) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Cross-origin or non-GET: never intercepted.
    Passthrough,
    Document,
    StaticAsset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Passthrough,
    NetworkFirst,
    CacheFirstRevalidate,
}

pub fn classify(req: &RequestInfo, origin: &Url) -> RequestClass {
    if req.url.origin() != origin.origin() || !req.method.eq_ignore_ascii_case("GET") {
        return RequestClass::Passthrough;
    }

    let url = req.url.as_str();
    let wants_html = req.accept.as_deref().is_some_and(|a| a.contains("text/html"));

    if req.destination == Destination::Document
        || wants_html
        || url.ends_with('/')
        || DOCUMENT_SEGMENTS.iter().any(|s| url.contains(s))
    {
        RequestClass::Document
    } else {
        RequestClass::StaticAsset
    }
}

/// The strategy table.
pub fn strategy_for(class: RequestClass) -> Strategy {
    match class {
        RequestClass::Passthrough => Strategy::Passthrough,
        RequestClass::Document => Strategy::NetworkFirst,
        RequestClass::StaticAsset => Strategy::CacheFirstRevalidate,
    }
}

/// Stylesheets, scripts and JSON data are refreshed in the background after a cache hit.
pub fn should_revalidate(key: &str) -> bool {
    key.contains("/css/") || key.contains("/js/") || key.split('?').next().is_some_and(|p| p.ends_with(".json"))
}

/// Cache receiving a background-refreshed response.
pub fn revalidation_cache(key: &str) -> CacheKind {
    if key.contains("/js/dist/") { CacheKind::Static } else { CacheKind::Dynamic }
}

/// Cache receiving an asset fetched after a cache miss.
pub fn miss_cache(key: &str) -> CacheKind {
    if is_critical(key) || ["/css/", "/js/dist/", "/img/"].iter().any(|s| key.contains(s)) {
        CacheKind::Static
    } else {
        CacheKind::Dynamic
    }
}

pub fn is_critical(key: &str) -> bool {
    CRITICAL_RESOURCES.iter().any(|r| key.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://blog.example").unwrap()
    }

    fn get(path: &str) -> RequestInfo {
        RequestInfo::get(origin().join(path).unwrap())
    }

    #[test]
    fn test_cross_origin_and_non_get_pass_through() {
        let cross = RequestInfo::get(Url::parse("https://cdn.example/app.js").unwrap());
        assert_eq!(classify(&cross, &origin()), RequestClass::Passthrough);

        let mut post = get("/api");
        post.method = "POST".into();
        assert_eq!(classify(&post, &origin()), RequestClass::Passthrough);
    }

    #[test]
    fn test_document_classification() {
        assert_eq!(classify(&get("/"), &origin()), RequestClass::Document);
        assert_eq!(classify(&get("/posts/hello"), &origin()), RequestClass::Document);
        assert_eq!(classify(&get("/categories/rust"), &origin()), RequestClass::Document);
        assert_eq!(classify(&get("/about.html").with_accept("text/html,*/*"), &origin()), RequestClass::Document);
        assert_eq!(
            classify(&get("/page").with_destination(Destination::Document), &origin()),
            RequestClass::Document
        );
    }

    #[test]
    fn test_asset_classification() {
        assert_eq!(classify(&get("/css/main.css"), &origin()), RequestClass::StaticAsset);
        assert_eq!(classify(&get("/img/a.png").with_accept("image/*"), &origin()), RequestClass::StaticAsset);
        assert_eq!(classify(&get("/index.json?v=1"), &origin()), RequestClass::StaticAsset);
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(strategy_for(RequestClass::Passthrough), Strategy::Passthrough);
        assert_eq!(strategy_for(RequestClass::Document), Strategy::NetworkFirst);
        assert_eq!(strategy_for(RequestClass::StaticAsset), Strategy::CacheFirstRevalidate);
    }

    #[test]
    fn test_cache_targets() {
        assert!(should_revalidate("/css/main.css"));
        assert!(should_revalidate("/js/app.js"));
        assert!(should_revalidate("/index.json"));
        assert!(!should_revalidate("/img/a.png"));
        assert!(!should_revalidate("/search?format=.json"));

        assert_eq!(revalidation_cache("/js/dist/main.min.js"), CacheKind::Static);
        assert_eq!(revalidation_cache("/css/main.css"), CacheKind::Dynamic);

        assert_eq!(miss_cache("/css/main.css"), CacheKind::Static);
        assert_eq!(miss_cache("/img/a.png"), CacheKind::Static);
        assert_eq!(miss_cache("/js/app.js"), CacheKind::Dynamic);
        assert_eq!(miss_cache("/fonts/a.woff2"), CacheKind::Dynamic);
    }

    #[test]
    fn test_cache_key_keeps_query_drops_fragment() {
        let url = Url::parse("https://blog.example/tags/?page=2#top").unwrap();
        assert_eq!(cache_key(&url), "/tags/?page=2");
        assert_eq!(cache_key(&origin()), "/");
    }

    #[test]
    fn test_cache_key_ignores_cache_buster() {
        let first = Url::parse("https://blog.example/index.json?v=1700000000000").unwrap();
        let second = Url::parse("https://blog.example/index.json?v=1700000009999").unwrap();
        assert_eq!(cache_key(&first), "/index.json");
        assert_eq!(cache_key(&first), cache_key(&second));

        let mixed = Url::parse("https://blog.example/search?q=rust&v=3&version=2").unwrap();
        assert_eq!(cache_key(&mixed), "/search?q=rust&version=2");
    }

    #[test]
    fn test_destination_deserialize_unknown() {
        let d: Destination = serde_json::from_str(r#""audioworklet""#).unwrap();
        assert_eq!(d, Destination::Other);
        let d: Destination = serde_json::from_str(r#""document""#).unwrap();
        assert_eq!(d, Destination::Document);
    }
}
