//! The network seam used by the cache controller.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::strategy::RequestInfo;
use crate::Error;
use crate::cache::StoredResponse;

/// Response tainting, as seen by a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    Cors,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    pub status: u16,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl NetworkResponse {
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            response_type: ResponseType::Basic,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    /// Only same-origin 200 responses are written to a cache.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    pub fn to_stored(&self, key: &str) -> StoredResponse {
        StoredResponse::new(key, self.status, self.content_type.clone(), self.body.to_vec())
    }
}

/// Performs a live network request.
///
/// `Err` means the request never produced a response (offline, DNS, timeout).
/// Non-success statuses are returned as `Ok`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, req: &RequestInfo) -> Result<NetworkResponse, Error>;
}
