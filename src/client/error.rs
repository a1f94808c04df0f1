//! Client Error Types
//!
//! Failures of the synchronization core. None of these ever escape the sync
//! engine as a panic or an unobserved task error: the engine converts them
//! into cache and status state.

use crate::shared::models::Collection;
use std::fmt;
use thiserror::Error;

/// Transport operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchAll,
    Insert,
    Update,
    Remove,
    Upload,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::FetchAll => "fetch_all",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Remove => "remove",
            Operation::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Underlying reason for a transport failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportCause {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    /// The backend answered but refused the write
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for TransportCause {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportCause::Decode(err.to_string())
        } else {
            TransportCause::Network(err.to_string())
        }
    }
}

/// Network or endpoint failure of a transport call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} on {collection} failed: {cause}")]
pub struct TransportError {
    pub collection: Collection,
    pub operation: Operation,
    #[source]
    pub cause: TransportCause,
}

impl TransportError {
    pub fn new(
        collection: Collection,
        operation: Operation,
        cause: impl Into<TransportCause>,
    ) -> Self {
        Self {
            collection,
            operation,
            cause: cause.into(),
        }
    }
}

/// Change-feed registration failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// A subscription for the same collection set is still alive
    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),
    #[error("failed to connect change feed: {0}")]
    Connect(String),
    #[error("change feed rejected subscription with HTTP {status}")]
    Rejected { status: u16 },
}

/// Lifecycle misuse of the sync engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("sync engine is already initialized")]
    AlreadyInitialized,
    #[error("sync engine has been torn down")]
    TornDown,
}
