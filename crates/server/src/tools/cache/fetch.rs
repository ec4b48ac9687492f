//! cache_fetch tool implementation.
//!
//! Routes a request through the cache controller exactly as an intercepted
//! page request: network-first for documents, cache-first for assets.

use karuta_core::worker::{CacheController, Destination, FetchOutcome, ResponseSource};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// Site-relative path (e.g. "/css/main.css") or absolute URL.
    pub path: String,

    /// Request destination: document, style, script, image, font or other.
    #[serde(default)]
    pub destination: Option<Destination>,

    /// Accept header value.
    #[serde(default)]
    pub accept: Option<String>,

    /// HTTP method (default GET). Anything else is passed through.
    #[serde(default)]
    pub method: Option<String>,

    /// Include the body as (lossy) UTF-8 text.
    #[serde(default)]
    pub include_body: bool,
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    /// False when the controller did not intercept the request.
    pub intercepted: bool,
    /// Where the response came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    /// Cache key of the served response, or the requested path.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Body size in bytes.
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(controller: &CacheController, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    let mut req = controller.request(&params.path)?;
    if let Some(destination) = params.destination {
        req = req.with_destination(destination);
    }
    if let Some(accept) = params.accept {
        req = req.with_accept(accept);
    }
    if let Some(method) = params.method {
        req.method = method.to_uppercase();
    }

    let output = match controller.handle_fetch(req).await? {
        FetchOutcome::Passthrough => CacheFetchOutput {
            intercepted: false,
            source: None,
            url: params.path,
            status: None,
            content_type: None,
            bytes: 0,
            body: None,
        },
        FetchOutcome::Served(resp) => CacheFetchOutput {
            intercepted: true,
            source: Some(resp.source),
            bytes: resp.body.len(),
            body: params.include_body.then(|| String::from_utf8_lossy(&resp.body).into_owned()),
            url: resp.url,
            status: Some(resp.status),
            content_type: resp.content_type,
        },
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{controller, output_json};

    fn params(path: &str) -> CacheFetchParams {
        CacheFetchParams { path: path.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_cached_asset_served_from_cache() {
        let controller = controller().await;
        let mut p = params("/css/main.css");
        p.include_body = true;

        let output = output_json(&fetch_impl(&controller, p).await.unwrap());
        assert_eq!(output["intercepted"], true);
        assert_eq!(output["source"], "cache");
        assert_eq!(output["body"], "page /css/main.css");
        controller.settle().await;
    }

    #[tokio::test]
    async fn test_document_from_network() {
        let controller = controller().await;
        let output = output_json(&fetch_impl(&controller, params("/posts/new/")).await.unwrap());
        assert_eq!(output["source"], "network");
        assert_eq!(output["status"], 200);
        assert!(output.get("body").is_none());
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let controller = controller().await;
        let mut p = params("/api/comments");
        p.method = Some("post".into());

        let output = output_json(&fetch_impl(&controller, p).await.unwrap());
        assert_eq!(output["intercepted"], false);
        assert_eq!(output["url"], "/api/comments");
    }

    #[tokio::test]
    async fn test_not_found_is_returned_uncached() {
        let controller = controller().await;
        let output = output_json(&fetch_impl(&controller, params("/missing")).await.unwrap());
        assert_eq!(output["status"], 404);
        assert_eq!(output["source"], "network");
    }
}
