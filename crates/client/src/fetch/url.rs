//! Site origin canonicalization and path resolution.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("missing host: {0}")]
    MissingHost(String),
}

/// Canonicalize a URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    let host = parsed
        .host_str()
        .map(str::to_lowercase)
        .ok_or_else(|| UrlError::MissingHost(trimmed.to_string()))?;
    parsed.set_host(Some(&host)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// The site root for `input`: scheme, host and port with path `/`.
pub fn site_origin(input: &str) -> Result<Url, UrlError> {
    let mut url = canonicalize(input)?;
    url.set_path("/");
    url.set_query(None);
    Ok(url)
}

/// Resolve a site-relative `path` (or an absolute URL) against `origin`.
pub fn resolve(origin: &Url, path: &str) -> Result<Url, UrlError> {
    let mut url = origin.join(path.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    url.set_fragment(None);
    Ok(url)
}

pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_default_scheme_and_lowercase_host() {
        let url = canonicalize("  BLOG.Example/posts/#top ").unwrap();
        assert_eq!(url.as_str(), "https://blog.example/posts/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("http://localhost:1313/index.json?v=1").unwrap();
        assert_eq!(url.query(), Some("v=1"));
        assert_eq!(url.port(), Some(1313));
    }

    #[test]
    fn test_canonicalize_rejects() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_site_origin_strips_path_and_query() {
        let origin = site_origin("http://localhost:1313/posts/a/?x=1").unwrap();
        assert_eq!(origin.as_str(), "http://localhost:1313/");
    }

    #[test]
    fn test_resolve_paths() {
        let origin = site_origin("https://blog.example").unwrap();
        assert_eq!(resolve(&origin, "/css/main.css").unwrap().as_str(), "https://blog.example/css/main.css");
        assert_eq!(resolve(&origin, "posts/#x").unwrap().as_str(), "https://blog.example/posts/");

        let other = resolve(&origin, "https://cdn.example/lib.js").unwrap();
        assert!(!same_origin(&origin, &other));
        assert!(same_origin(&origin, &resolve(&origin, "/tags/").unwrap()));
    }
}
