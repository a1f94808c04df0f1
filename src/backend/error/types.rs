/**
 * Backend Error Types
 *
 * Errors raised by the storage server's HTTP handlers. Every variant maps
 * to a status code and a message, and converts into a JSON error response
 * (see `conversion.rs`).
 *
 * # Error Categories
 *
 * - `HandlerError` - bad request input (missing header, malformed body)
 * - `StorageError` - the snapshot file could not be read or written
 * - `SharedError` - validation and serialization errors from the shared types
 */

use crate::shared::SharedError;
use axum::http::StatusCode;
use thiserror::Error;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request-level failure with an explicit status
    #[error("Handler error: {message}")]
    HandlerError { status: StatusCode, message: String },

    /// Snapshot persistence failure
    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// HTTP status for this error
    ///
    /// - `HandlerError` - the status it carries
    /// - `StorageError` - 500
    /// - `SharedError` - 400 for validation, 500 for serialization
    /// - `SerializationError` - 400, the request body did not parse
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StorageError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StorageError { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
