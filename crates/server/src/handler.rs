//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheFetchParams, fetch_impl, status_impl};
use crate::tools::search_history::{SearchHistoryParams, history_impl};
use crate::tools::site_search::{SiteSearchParams, search_impl};
use crate::tools::update_notice::{UpdateNoticeParams, respond_impl};

use karuta_core::search::SearchSession;
use karuta_core::worker::{CacheController, Registration};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for karuta.
#[derive(Clone)]
pub struct KarutaServer {
    tool_router: ToolRouter<Self>,
    session: Arc<SearchSession>,
    controller: Arc<CacheController>,
    registration: Arc<Registration>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl KarutaServer {
    /// Create a new server handler over a search session, an activated cache
    /// controller and the registration whose update checks raise the notice.
    pub fn new(session: Arc<SearchSession>, controller: Arc<CacheController>, registration: Arc<Registration>) -> Self {
        Self { tool_router: Self::tool_router(), session, controller, registration }
    }

    /// Search the site's content index.
    ///
    /// Results are ranked by where the query first appears (title before
    /// content) and by how early, then filtered and sorted per the session.
    #[tool(
        description = "Search the blog's posts and pages. Returns ranked hits with highlighted excerpts. Filters and sort order persist across calls."
    )]
    async fn site_search(&self, params: Parameters<SiteSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.session, params.0).await
    }

    #[tool(description = "List, add, remove or clear recent search queries (most recent first).")]
    async fn search_history(&self, params: Parameters<SearchHistoryParams>) -> Result<CallToolResult, McpError> {
        history_impl(&self.session, params.0).await
    }

    /// Route a request through the offline cache.
    ///
    /// Documents go network-first with a cached fallback; static assets are
    /// served cache-first and stylesheets/scripts are refreshed in the background.
    #[tool(
        description = "Fetch a site path through the offline cache. Reports whether the response came from the network, the cache or the offline fallback."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, params.0).await
    }

    #[tool(
        description = "Report the cache controller state, stored caches, content index size and any pending update notice."
    )]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller, &self.session, &self.registration).await
    }

    #[tool(
        description = "Answer the \"new content available\" notice: update_now reloads the content index, later dismisses it."
    )]
    async fn update_notice(&self, params: Parameters<UpdateNoticeParams>) -> Result<CallToolResult, McpError> {
        respond_impl(&self.registration, &self.session, params.0).await
    }
}

impl ServerHandler for KarutaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "karuta".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Site search and offline cache for a static blog.".into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{controller, registration, session};

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let (_db, session) = session().await;
        let server = KarutaServer::new(Arc::new(session), Arc::new(controller().await), Arc::new(registration()));

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["cache_fetch", "cache_status", "search_history", "site_search", "update_notice"]);
        assert_eq!(server.get_info().server_info.name, "karuta");
    }
}
