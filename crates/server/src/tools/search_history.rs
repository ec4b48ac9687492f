//! search_history tool implementation.
//!
//! Lists or edits the persisted search history (most recent first).

use karuta_core::search::{SearchSession, render};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    #[default]
    List,
    Add,
    Remove,
    Clear,
}

/// Parameters for the search_history tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryParams {
    /// list (default), add, remove or clear.
    #[serde(default)]
    pub action: HistoryAction,

    /// Query to add or remove. Matching is exact and case-sensitive.
    #[serde(default)]
    pub query: Option<String>,
}

/// Output from the search_history tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryOutput {
    /// History after the action, most recent first.
    pub entries: Vec<String>,
    /// Whether the action changed the history.
    pub changed: bool,
    /// Rendered history list; absent when the history is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

fn required_query(params: &SearchHistoryParams) -> Result<&str, ToolError> {
    params
        .query
        .as_deref()
        .ok_or_else(|| ToolError::InvalidInput(format!("query is required for {:?}", params.action)))
}

/// Implementation of the search_history tool.
pub async fn history_impl(session: &SearchSession, params: SearchHistoryParams) -> Result<CallToolResult, McpError> {
    let before = session.history().await;

    let changed = match params.action {
        HistoryAction::List => false,
        HistoryAction::Add => session.add_history(required_query(&params)?).await,
        HistoryAction::Remove => {
            let query = required_query(&params)?;
            session.remove_history(query).await;
            before.iter().any(|q| q == query)
        }
        HistoryAction::Clear => {
            session.clear_history().await;
            !before.is_empty()
        }
    };

    let entries = session.history().await;
    let output = SearchHistoryOutput { html: render::render_history(&entries), entries, changed };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output_json, session};

    fn params(action: HistoryAction, query: Option<&str>) -> SearchHistoryParams {
        SearchHistoryParams { action, query: query.map(str::to_string) }
    }

    #[tokio::test]
    async fn test_add_list_remove_clear() {
        let (_db, session) = session().await;

        let output = output_json(&history_impl(&session, params(HistoryAction::Add, Some("rust"))).await.unwrap());
        assert_eq!(output["changed"], true);
        history_impl(&session, params(HistoryAction::Add, Some("wasm"))).await.unwrap();

        let output = output_json(&history_impl(&session, SearchHistoryParams::default()).await.unwrap());
        assert_eq!(output["entries"], serde_json::json!(["wasm", "rust"]));
        assert!(output["html"].as_str().unwrap().contains(r#"data-query="rust""#));

        let output = output_json(&history_impl(&session, params(HistoryAction::Remove, Some("rust"))).await.unwrap());
        assert_eq!(output["changed"], true);
        assert_eq!(output["entries"], serde_json::json!(["wasm"]));

        let output = output_json(&history_impl(&session, params(HistoryAction::Clear, None)).await.unwrap());
        assert_eq!(output["changed"], true);
        assert!(output.get("html").is_none());
    }

    #[tokio::test]
    async fn test_short_query_not_added() {
        let (_db, session) = session().await;
        let output = output_json(&history_impl(&session, params(HistoryAction::Add, Some("a"))).await.unwrap());
        assert_eq!(output["changed"], false);
        assert_eq!(output["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_add_requires_query() {
        let (_db, session) = session().await;
        let err = history_impl(&session, params(HistoryAction::Add, None)).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
