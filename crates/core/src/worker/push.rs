//! Push and background-sync handling.
//!
//! Push payloads turn into a notification; sync events are acknowledged and
//! logged without any retry queue behind them.

use serde::{Deserialize, Serialize};

use crate::Error;

pub const NOTIFICATION_TAG: &str = "karuta-notification";

pub const SYNC_TAG: &str = "background-sync";

#[derive(Debug, Clone, Deserialize)]
struct PushPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
}

/// Build the notification for a push event.
///
/// A push without data shows nothing. A payload that is not a JSON object
/// is rejected.
pub fn handle_push(data: Option<&[u8]>, icon: &str) -> Result<Option<Notification>, Error> {
    let Some(data) = data else {
        return Ok(None);
    };
    let payload: PushPayload =
        serde_json::from_slice(data).map_err(|e| Error::InvalidInput(format!("push payload: {e}")))?;

    Ok(Some(Notification {
        title: payload.title,
        body: payload.body,
        icon: icon.to_string(),
        badge: icon.to_string(),
        tag: NOTIFICATION_TAG.to_string(),
    }))
}

/// Returns whether the sync tag was recognised.
pub fn handle_sync(tag: &str) -> bool {
    if tag == SYNC_TAG {
        tracing::info!(tag, "background sync triggered");
        true
    } else {
        tracing::debug!(tag, "ignoring unknown sync tag");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_builds_notification() {
        let payload = r#"{"title":"新着","body":"記事を公開しました"}"#;
        let n = handle_push(Some(payload.as_bytes()), "/img/default-cover.svg").unwrap().unwrap();
        assert_eq!(n.title, "新着");
        assert_eq!(n.body, "記事を公開しました");
        assert_eq!(n.icon, "/img/default-cover.svg");
        assert_eq!(n.badge, n.icon);
        assert_eq!(n.tag, NOTIFICATION_TAG);
    }

    #[test]
    fn test_push_without_data() {
        assert!(handle_push(None, "/i.svg").unwrap().is_none());
    }

    #[test]
    fn test_push_invalid_payload() {
        assert!(matches!(handle_push(Some(b"not json"), "/i.svg"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_sync_tags() {
        assert!(handle_sync("background-sync"));
        assert!(!handle_sync("other"));
    }
}
