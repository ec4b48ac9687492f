//! cache_status tool implementation.

use karuta_core::search::SearchSession;
use karuta_core::worker::{CacheController, ControllerStatus, Registration};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use crate::tools::update_notice::NoticeView;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Lifecycle state, current cache names and every stored cache.
    pub controller: ControllerStatus,
    /// Entries in the in-memory content index; absent before the first search.
    pub index_entries: Option<usize>,
    /// Queries in the search history.
    pub history_entries: usize,
    /// Visible "new content available" notice, answered with update_notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_notice: Option<NoticeView>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(
    controller: &CacheController, session: &SearchSession, registration: &Registration,
) -> Result<CallToolResult, McpError> {
    let output = CacheStatusOutput {
        controller: controller.status().await?,
        index_entries: session.index().len().await,
        history_entries: session.history().await.len(),
        update_notice: registration.notice().await.as_ref().map(NoticeView::from),
    };
    json_result(&output)
}
