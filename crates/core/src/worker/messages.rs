//! Worker-to-page messages.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// A cached asset was refreshed in the background.
    CacheUpdated { url: String },
    /// A critical resource was cached for the first time.
    CriticalResourceCached { url: String },
}

/// Every open client, modelled as broadcast subscribers.
#[derive(Debug, Clone)]
pub struct Clients {
    tx: broadcast::Sender<ClientMessage>,
}

impl Default for Clients {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl Clients {
    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.tx.subscribe()
    }

    pub fn count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Post `message` to all clients; returns how many received it.
    pub fn post(&self, message: ClientMessage) -> usize {
        match self.tx.send(message) {
            Ok(n) => n,
            Err(broadcast::error::SendError(message)) => {
                tracing::trace!(?message, "no clients to notify");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_value(ClientMessage::CacheUpdated { url: "/css/main.css".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "CACHE_UPDATED", "url": "/css/main.css"}));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"CRITICAL_RESOURCE_CACHED","url":"/css/critical.css"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CriticalResourceCached { url: "/css/critical.css".into() });
    }

    #[tokio::test]
    async fn test_post_reaches_all_clients() {
        let clients = Clients::default();
        let mut a = clients.subscribe();
        let mut b = clients.subscribe();

        assert_eq!(clients.post(ClientMessage::CacheUpdated { url: "/x".into() }), 2);
        assert_eq!(a.recv().await.unwrap(), ClientMessage::CacheUpdated { url: "/x".into() });
        assert_eq!(b.recv().await.unwrap(), ClientMessage::CacheUpdated { url: "/x".into() });
    }

    #[test]
    fn test_post_without_clients() {
        let clients = Clients::default();
        assert_eq!(clients.count(), 0);
        assert_eq!(clients.post(ClientMessage::CacheUpdated { url: "/x".into() }), 0);
    }
}
