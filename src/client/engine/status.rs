//! Engine lifecycle and status types

use crate::shared::models::Collection;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;

/// Lifecycle of the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    /// Loading with no usable data yet (startup, or recovering from Error)
    Loading,
    Ready,
    /// Re-fetching while the cache keeps serving the last good data
    Refreshing,
    /// Last load exhausted its retries; the cache may be stale
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::Loading => "loading",
            SyncState::Ready => "ready",
            SyncState::Refreshing => "refreshing",
            SyncState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Health of the change-feed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not started, or released on teardown
    Inactive,
    Connecting,
    Live,
    /// No feed, or subscription gave up; only polling and refocus refresh
    PollingOnly,
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq)]
pub struct SyncErrorRecord {
    /// None for failures not tied to a collection (feed setup)
    pub collection: Option<Collection>,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub feed: FeedStatus,
    pub errors: Vec<SyncErrorRecord>,
    pub pending_writes: usize,
    pub revision: u64,
}

/// Bounded error log, oldest entries dropped first
#[derive(Debug)]
pub(crate) struct ErrorLog {
    records: VecDeque<SyncErrorRecord>,
    capacity: usize,
}

impl ErrorLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, collection: Option<Collection>, message: impl Into<String>) {
        self.records.push_back(SyncErrorRecord {
            collection,
            message: message.into(),
            at: Utc::now(),
        });
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<SyncErrorRecord> {
        self.records.iter().cloned().collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<SyncErrorRecord> {
        self.records.drain(..).collect()
    }
}
