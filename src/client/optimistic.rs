//! # Pending Optimistic Mutations
//!
//! Local writes that are already visible in the cache but not yet
//! acknowledged by the transport. A reconciliation refresh replaces a whole
//! collection with remote state that may predate those writes, so the engine
//! re-applies the pending ones on top of every refresh result.
//!
//! An entry is dropped when its transport call settles, successfully or not.
//! A failed write is not re-applied and the following refresh reverts it.

use crate::client::cache::CacheStore;
use crate::shared::models::{Collection, Mutation};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An unacknowledged local write
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub id: Uuid,
    pub mutation: Mutation,
    pub applied_at: DateTime<Utc>,
}

/// Unacknowledged writes in dispatch order
#[derive(Debug, Default)]
pub struct PendingMutations {
    entries: Vec<PendingMutation>,
}

impl PendingMutations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a mutation that was just applied to the cache
    pub fn track(&mut self, mutation: Mutation) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push(PendingMutation {
            id,
            mutation,
            applied_at: Utc::now(),
        });
        id
    }

    /// Forget a mutation once the transport call settled
    pub fn settle(&mut self, id: Uuid) -> Option<PendingMutation> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_for(&self, collection: Collection) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.mutation.collection() == collection)
            .count()
    }

    /// Replay pending writes of `collection` onto a freshly loaded cache
    pub fn reapply(&self, cache: &mut CacheStore, collection: Collection) -> usize {
        let mut replayed = 0;
        for entry in &self.entries {
            if entry.mutation.collection() == collection {
                cache.apply(&entry.mutation);
                replayed += 1;
            }
        }
        replayed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
