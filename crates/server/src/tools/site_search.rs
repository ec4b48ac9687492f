//! site_search tool implementation.
//!
//! Runs a query through the search session: positional scoring over the
//! merged content index, then filter, sort and truncation. Filters and sort
//! order persist for the rest of the session.

use karuta_core::Error;
use karuta_core::search::{FilterKind, SearchHit, SearchSession, SortOrder};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for site_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteSearchParams {
    /// Search query (required). Queries shorter than two characters return no results.
    pub query: String,

    /// Result ordering: relevance (default), date or title.
    #[serde(default)]
    pub sort_order: Option<SortOrder>,

    /// Include posts. When false no results are returned.
    #[serde(default)]
    pub posts: Option<bool>,

    /// Tag filter toggle. Reserved: it is stored but does not affect results.
    #[serde(default)]
    pub tags: Option<bool>,

    /// Category filter toggle. Reserved: it is stored but does not affect results.
    #[serde(default)]
    pub categories: Option<bool>,

    /// Record the query in the search history (default true).
    #[serde(default = "default_true")]
    pub record_history: bool,

    /// Refetch the content index before searching.
    #[serde(default)]
    pub refresh_index: bool,

    /// Include the rendered result markup.
    #[serde(default)]
    pub include_html: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for site_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteSearchOutput {
    /// The query as given.
    pub query: String,
    /// Count label, e.g. "2件". Empty when the query was too short.
    pub count_label: String,
    /// Active filter label, e.g. "2/3 フィルター有効". Empty when all filters are on.
    pub active_filters: String,
    /// Ranked results.
    pub hits: Vec<SearchHit>,
    /// Rendered result markup, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Whether the query was added to the history.
    pub history_recorded: bool,
}

/// Implementation of the site_search tool.
pub async fn search_impl(session: &SearchSession, params: SiteSearchParams) -> Result<CallToolResult, McpError> {
    if params.query.trim().is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".into()).into());
    }

    let mut filters = session.filters().await;
    if let Some(order) = params.sort_order {
        filters.sort_order = order;
    }
    for (kind, enabled) in [
        (FilterKind::Posts, params.posts),
        (FilterKind::Tags, params.tags),
        (FilterKind::Categories, params.categories),
    ] {
        if let Some(enabled) = enabled {
            filters.set(kind, enabled);
        }
    }
    session.replace_filters(filters).await;

    if params.refresh_index {
        let count = session.refresh_index().await;
        tracing::debug!(count, "content index refreshed on request");
    }

    let outcome = session
        .search_with(&params.query, params.record_history)
        .await
        .ok_or_else(|| ToolError::Superseded(format!("search for {:?} was replaced by a newer one", params.query)))?;

    let output = SiteSearchOutput {
        html: params.include_html.then_some(outcome.html),
        query: outcome.query,
        count_label: outcome.count_label,
        active_filters: filters.active_label(),
        hits: outcome.hits,
        history_recorded: outcome.history_recorded,
    };

    json_result(&output)
}
