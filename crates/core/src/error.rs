//! Unified error types for precache.
//!
//! Each variant carries a stable code prefix so hosts can match on it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the precache worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL or origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A cache store could not be opened or written.
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),

    /// The persisted manifest record could not be parsed.
    #[error("MANIFEST_CORRUPT: {0}")]
    ManifestCorrupt(String),

    /// Transport-level fetch failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A bulk fetch received a non-ok response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A shell resource could not be fetched during install.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Activation aborted; all stores were wiped.
    #[error("ACTIVATION_FAILED: {0}")]
    ActivationFailed(String),

    /// Offline prefetch batch failed.
    #[error("PREFETCH_FAILED: {0}")]
    PrefetchFailed(String),

    /// Lifecycle event arrived in the wrong worker state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// Message payload not understood by the worker.
    #[error("UNKNOWN_MESSAGE: {0}")]
    UnknownMessage(String),

    /// The worker task has stopped and cannot accept events.
    #[error("WORKER_CLOSED")]
    WorkerClosed,
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

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::StoreUnavailable(msg) => (-32002, msg.clone()),
            Error::ManifestCorrupt(msg) => (-32013, msg.clone()),
            Error::Network(msg) => (-32008, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::InstallFailed(msg) => (-32020, msg.clone()),
            Error::ActivationFailed(msg) => (-32021, msg.clone()),
            Error::PrefetchFailed(msg) => (-32022, msg.clone()),
            Error::InvalidState(msg) => (-32023, msg.clone()),
            Error::UnknownMessage(msg) => (-32602, msg.clone()),
            Error::WorkerClosed => (-32024, "Worker task has stopped".to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed("main.js".to_string());
        assert!(err.to_string().contains("INSTALL_FAILED"));
        assert!(err.to_string().contains("main.js"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::ActivationFailed("store gone".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32021);
    }

    #[test]
    fn test_unknown_message_is_invalid_params() {
        let mcp_err: McpError = Error::UnknownMessage("reboot".into()).into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
