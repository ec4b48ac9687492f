//! Tool-layer errors for the karuta server.
//!
//! Failures raised by the search and cache subsystems use
//! `karuta_core::Error`; these cover the request handling around them.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid tool parameters (e.g., missing query for an add).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A newer search replaced this one before it completed.
    #[error("SUPERSEDED: {0}")]
    Superseded(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::Superseded(msg) => (-32011, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
