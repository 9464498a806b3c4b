//! Unified error types for chordstash.
//!
//! Storage-engine errors are converted at the store boundary; nothing above
//! the cache layer sees a rusqlite type.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the chordstash service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Durable storage could not be opened at all.
    #[error("STORAGE_UNAVAILABLE: {0}")]
    StorageUnavailable(String),

    /// A write failed because the storage quota is exhausted.
    #[error("QUOTA_EXCEEDED: {0}")]
    QuotaExceeded(String),

    /// Stored payload JSON failed to parse.
    #[error("MALFORMED_PAYLOAD: {0}")]
    MalformedPayload(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response from the chord-sheet site.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Chord extraction failed on the scraped page.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),
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
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            other => Error::Database(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::DiskFull => {
                Error::QuotaExceeded(err.to_string())
            }
            _ => Error::Database(tokio_rusqlite::Error::Error(err)),
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::MalformedPayload(msg) => (-32002, msg.clone()),
            Error::StorageUnavailable(msg) => (-32003, msg.clone()),
            Error::QuotaExceeded(msg) => (-32004, msg.clone()),
            Error::InvalidUrl(msg) => (-32005, msg.clone()),
            Error::HttpError(msg) => (-32006, msg.clone()),
            Error::FetchTimeout(msg) => (-32007, msg.clone()),
            Error::FetchTooLarge(msg) => (-32008, msg.clone()),
            Error::ExtractFailed(msg) => (-32009, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::QuotaExceeded("database or disk is full".to_string());
        assert!(err.to_string().contains("QUOTA_EXCEEDED"));
        assert!(err.to_string().contains("disk is full"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("artist and title are required".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_disk_full_maps_to_quota() {
        let inner = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error { code: rusqlite::ErrorCode::DiskFull, extended_code: 13 },
            Some("database or disk is full".to_string()),
        );
        let err = Error::from(inner);
        assert!(matches!(err, Error::QuotaExceeded(_)));
    }
}
