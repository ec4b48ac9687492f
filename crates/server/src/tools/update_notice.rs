//! update_notice tool implementation.
//!
//! Answers the "new content available" notice raised by the periodic update
//! check. `update_now` reloads the content index; `later` only dismisses.

use karuta_core::search::SearchSession;
use karuta_core::worker::{Registration, UpdateAction, UpdateNotice};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the update_notice tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNoticeParams {
    /// update_now or later.
    pub action: UpdateAction,
}

/// A visible update notice.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoticeView {
    pub title: String,
    pub message: String,
    /// Seconds until the notice hides itself.
    pub remaining_secs: u64,
}

impl From<&UpdateNotice> for NoticeView {
    fn from(notice: &UpdateNotice) -> Self {
        let remaining = notice.remaining();
        // Round up so a live notice never reports 0.
        let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Self { title: notice.title.to_string(), message: notice.message.to_string(), remaining_secs }
    }
}

/// Output from the update_notice tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNoticeOutput {
    /// False when no notice was visible (never raised, expired or already answered).
    pub answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<UpdateAction>,
    /// Entries in the reloaded index, after `update_now`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_entries: Option<usize>,
}

/// Implementation of the update_notice tool.
pub async fn respond_impl(
    registration: &Registration, session: &SearchSession, params: UpdateNoticeParams,
) -> Result<CallToolResult, McpError> {
    let action = registration.respond(params.action).await;
    let index_entries = match action {
        Some(UpdateAction::UpdateNow) => Some(session.refresh_index().await),
        Some(UpdateAction::Later) | None => None,
    };

    json_result(&UpdateNoticeOutput { answered: action.is_some(), action, index_entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output_json, registration as default_registration, session};
    use karuta_core::worker::WorkerState;
    use std::time::Duration;

    fn params(action: UpdateAction) -> UpdateNoticeParams {
        UpdateNoticeParams { action }
    }

    #[tokio::test]
    async fn test_update_now_reloads_index() {
        let (_db, session) = session().await;
        let registration = default_registration();
        assert!(registration.on_worker_state(WorkerState::Installed, true).await);

        let result = respond_impl(&registration, &session, params(UpdateAction::UpdateNow)).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["answered"], true);
        assert_eq!(output["action"], "update_now");
        assert_eq!(output["index_entries"], 2);

        let output = output_json(&respond_impl(&registration, &session, params(UpdateAction::Later)).await.unwrap());
        assert_eq!(output["answered"], false);
        assert!(output.get("action").is_none());
    }

    #[tokio::test]
    async fn test_later_only_dismisses() {
        let (_db, session) = session().await;
        let registration = default_registration();
        registration.on_worker_state(WorkerState::Installed, true).await;

        let output = output_json(&respond_impl(&registration, &session, params(UpdateAction::Later)).await.unwrap());
        assert_eq!(output["answered"], true);
        assert!(output.get("index_entries").is_none());
        assert_eq!(session.index().len().await, None);
        assert!(registration.notice().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_view_counts_down() {
        let registration = default_registration();
        registration.on_worker_state(WorkerState::Installed, true).await;
        let notice = registration.notice().await.unwrap();
        assert_eq!(NoticeView::from(&notice).remaining_secs, 30);

        tokio::time::advance(Duration::from_millis(29_500)).await;
        assert_eq!(NoticeView::from(&notice).remaining_secs, 1);
    }
}
