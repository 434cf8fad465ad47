//! Unified error types for shelf.
//!
//! Display strings carry an upper-case code prefix so that log lines and
//! tool errors can be grepped by category.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the shelf cache layer and storefront server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty product name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A requested row does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The mutation conflicts with current state (e.g., insufficient stock).
    #[error("CONFLICT: {0}")]
    Conflict(String),

    /// The cache backend could not be reached or failed an operation.
    #[error("CACHE_ERROR: store unavailable: {0}")]
    StoreUnavailable(String),

    /// Enumeration-based invalidation could not complete.
    #[error("CACHE_ERROR: partial invalidation: {0}")]
    InvalidationPartial(String),

    /// Key cannot be used by the selected backend.
    #[error("CACHE_ERROR: invalid key: {0}")]
    InvalidKey(String),

    /// Cached value could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem operation failed.
    #[error("CACHE_ERROR: io: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl Error {
    /// Whether the error originates in the cache store rather than the caller.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_)
                | Error::InvalidationPartial(_)
                | Error::InvalidKey(_)
                | Error::Io(_)
                | Error::Database(_)
                | Error::MigrationFailed(_)
        )
    }
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
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Conflict(msg) => (-32003, msg.clone()),
            Error::StoreUnavailable(_)
            | Error::InvalidationPartial(_)
            | Error::InvalidKey(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Database(_)
            | Error::MigrationFailed(_) => (-32002, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("product 42".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("product 42"));

        let err = Error::StoreUnavailable("connection refused".to_string());
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NotFound("product 42".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);

        let err = Error::InvalidInput("name cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_store_error_classification() {
        assert!(Error::StoreUnavailable("down".into()).is_store_error());
        assert!(Error::InvalidKey("a/b".into()).is_store_error());
        assert!(!Error::Conflict("stock".into()).is_store_error());
        assert!(!Error::InvalidInput("bad".into()).is_store_error());
    }
}
