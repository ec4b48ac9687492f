//! Versioned cache names and the enumerated resource lists.

use serde::{Deserialize, Serialize};

/// Shell resources pre-cached on install.
pub const SHELL_RESOURCES: &[&str] = &[
    "/",
    "/css/main.css",
    "/css/chroma.css",
    "/css/critical.css",
    "/js/dist/critical.min.js",
    "/js/dist/main.min.js",
    "/js/dist/lazy.min.js",
    "/img/default-cover.svg",
    "/posts/",
    "/tags/",
    "/archives/",
    "/about/",
];

/// Resources whose first caching is announced to clients.
pub const CRITICAL_RESOURCES: &[&str] = &["/css/critical.css", "/js/dist/critical.min.js"];

/// Cached document served when nothing better is available offline.
pub const OFFLINE_FALLBACK: &str = "/";

/// Which of the two current caches a response belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Static,
    Dynamic,
}

/// The current static and dynamic cache names for one version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub static_cache: String,
    pub dynamic_cache: String,
}

impl CacheNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_cache: format!("{prefix}-static-{version}"),
            dynamic_cache: format!("{prefix}-dynamic-{version}"),
        }
    }

    pub fn get(&self, kind: CacheKind) -> &str {
        match kind {
            CacheKind::Static => &self.static_cache,
            CacheKind::Dynamic => &self.dynamic_cache,
        }
    }

    /// True for either current cache name; everything else is swept on activation.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_cache || name == self.dynamic_cache
    }
}
