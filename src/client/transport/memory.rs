//! In-process table store
//!
//! Behaves like the remote table store (per-row writes, members read by
//! name, photos newest first) and publishes a `ChangeEvent` for every write,
//! which `change_feed()` turns into a change feed. Used for demos and tests.

use super::Transport;
use crate::client::change_feed::BroadcastChangeFeed;
use crate::client::error::{Operation, TransportCause, TransportError};
use crate::shared::event::{ChangeEvent, ChangeKind};
use crate::shared::models::{self, Collection, Record, Records, Snapshot};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct MemoryTransport {
    state: RwLock<Snapshot>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl MemoryTransport {
    pub fn new(initial: Snapshot) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(initial),
            events,
        }
    }

    /// Change feed fed by this store's writes
    pub fn change_feed(&self) -> BroadcastChangeFeed {
        BroadcastChangeFeed::new(self.events.clone())
    }

    /// Copy of the stored state
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().clone()
    }

    /// Overwrite the stored state, announcing every collection that changed
    pub fn replace(&self, snapshot: Snapshot) {
        let changed = {
            let mut state = self.state.write();
            let changed = state.changed_collections(&snapshot);
            *state = snapshot;
            changed
        };
        for collection in changed {
            self.publish(ChangeEvent::bulk(collection));
        }
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Records, TransportError> {
        let state = self.state.read();
        let records = match collection {
            Collection::Members => {
                let mut members = state.members.clone();
                models::sort_members(&mut members);
                Records::Members(members)
            }
            Collection::Photos => {
                let mut photos = state.photos.clone();
                models::sort_photos(&mut photos);
                Records::Photos(photos)
            }
        };
        Ok(records)
    }

    async fn insert(&self, record: Record) -> Result<(), TransportError> {
        let collection = record.collection();
        let id = record.id().to_string();
        {
            let mut state = self.state.write();
            let exists = match &record {
                Record::Member(m) => state.members.iter().any(|e| e.id == m.id),
                Record::Photo(p) => state.photos.iter().any(|e| e.id == p.id),
            };
            if exists {
                return Err(TransportError::new(
                    collection,
                    Operation::Insert,
                    TransportCause::Rejected(format!("duplicate id {}", id)),
                ));
            }
            state.apply(&models::Mutation::Insert(record));
        }
        self.publish(ChangeEvent::new(collection, ChangeKind::Insert).with_record(id));
        Ok(())
    }

    async fn update(&self, record: Record) -> Result<(), TransportError> {
        let collection = record.collection();
        let id = record.id().to_string();
        let found = {
            let mut state = self.state.write();
            match record {
                Record::Member(m) => models::replace(&mut state.members, m),
                Record::Photo(p) => models::replace(&mut state.photos, p),
            }
        };
        // Matches a table UPDATE ... WHERE id = X touching zero rows
        if found {
            self.publish(ChangeEvent::new(collection, ChangeKind::Update).with_record(id));
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), TransportError> {
        let removed = {
            let mut state = self.state.write();
            match collection {
                Collection::Members => models::remove(&mut state.members, id),
                Collection::Photos => models::remove(&mut state.photos, id),
            }
        };
        if removed {
            self.publish(ChangeEvent::new(collection, ChangeKind::Delete).with_record(id));
        }
        Ok(())
    }
}
