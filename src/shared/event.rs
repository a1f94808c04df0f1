/**
 * Change Notification Events
 *
 * A `ChangeEvent` says that a row in one of the tracked collections was
 * inserted, updated or deleted. Consumers never apply the event as a delta;
 * it only tells them which collection to re-fetch.
 */
use crate::shared::models::Collection;
use serde::{Deserialize, Serialize};

/// Kind of row-level change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Several rows changed at once (whole-snapshot writes)
    Bulk,
}

/// Change notification for one collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Collection that changed
    pub collection: Collection,
    /// What happened
    pub kind: ChangeKind,
    /// Affected row, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Timestamp when the change was observed
    pub timestamp: String,
}

impl ChangeEvent {
    /// Create a new change event
    pub fn new(collection: Collection, kind: ChangeKind) -> Self {
        Self {
            collection,
            kind,
            record_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whole-collection change
    pub fn bulk(collection: Collection) -> Self {
        Self::new(collection, ChangeKind::Bulk)
    }

    /// Attach the affected row id
    pub fn with_record(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }
}
