//! Unified error types for karuta.
//!
//! Every variant renders with a stable upper-case code prefix so that log
//! lines and tool errors can be matched without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the search and cache subsystems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query, bad lifecycle transition).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or cross-origin URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network request failed or returned an unusable response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A content index source could not be fetched or decoded.
    #[error("INDEX_FETCH_FAILED: {0}")]
    IndexFetch(String),

    /// Durable key-value storage rejected a read or write.
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),

    /// Neither the network nor any cache produced a response.
    #[error("NO_RESPONSE: {0}")]
    NoResponse(String),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::IndexFetch(msg) => (-32009, msg.clone()),
            Error::NoResponse(msg) => (-32010, msg.clone()),
            Error::Storage(msg) => (-32002, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
