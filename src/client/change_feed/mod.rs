//! # Change Feed
//!
//! Push notifications for remote row changes. A feed never delivers row data:
//! on any insert, update or delete in a subscribed collection it invokes the
//! callback with the affected [`Collection`], and the sync engine re-fetches
//! that whole collection.
//!
//! ## Subscription lifetime
//!
//! `subscribe` returns a [`SubscriptionHandle`] which owns the background
//! task reading the feed. Dropping the handle (or calling
//! [`SubscriptionHandle::unsubscribe`]) aborts the task and releases the
//! registration, so a torn-down engine cannot leak a live connection.
//!
//! Each feed keeps a [`SubscriptionRegistry`]: while a handle for a given
//! collection set is alive, a second `subscribe` for the same set fails with
//! [`SubscriptionError::AlreadySubscribed`].
//!
//! ## Implementations
//!
//! - `broadcast.rs`: in-process feed over a tokio broadcast channel
//! - `sse.rs`: `text/event-stream` from the storage server's realtime endpoint
//! - `table.rs`: the remote table store's realtime websocket

pub mod broadcast;
pub mod sse;
pub mod table;

pub use broadcast::BroadcastChangeFeed;
pub use sse::SseChangeFeed;
pub use table::TableChangeFeed;

use crate::client::error::SubscriptionError;
use crate::shared::models::Collection;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Invoked with the collection that changed
pub type ChangeCallback = Arc<dyn Fn(Collection) + Send + Sync>;

/// Source of remote change notifications
#[async_trait]
pub trait ChangeFeed: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Register interest in every change to `collections`
    async fn subscribe(
        &self,
        collections: &[Collection],
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError>;
}

/// Canonical form of a collection set: sorted, deduplicated
pub fn normalize(collections: &[Collection]) -> Vec<Collection> {
    let mut set = collections.to_vec();
    set.sort();
    set.dedup();
    set
}

fn set_key(collections: &[Collection]) -> String {
    collections
        .iter()
        .map(Collection::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Collection sets with a live subscription
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a collection set, failing if it is already subscribed
    pub fn claim(&self, collections: &[Collection]) -> Result<Claim, SubscriptionError> {
        let set = normalize(collections);
        if set.is_empty() {
            return Err(SubscriptionError::Connect(
                "no collections to subscribe to".to_string(),
            ));
        }
        let key = set_key(&set);
        if !self.active.lock().insert(key.clone()) {
            return Err(SubscriptionError::AlreadySubscribed(key));
        }
        Ok(Claim {
            key,
            collections: set,
            registry: self.clone(),
        })
    }

    pub fn is_subscribed(&self, collections: &[Collection]) -> bool {
        self.active.lock().contains(&set_key(&normalize(collections)))
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

/// A reserved collection set, released on drop
#[derive(Debug)]
pub struct Claim {
    key: String,
    collections: Vec<Collection>,
    registry: SubscriptionRegistry,
}

impl Claim {
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.key);
    }
}

/// One live change-feed registration
#[derive(Debug)]
pub struct SubscriptionHandle {
    claim: Claim,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn new(claim: Claim, task: JoinHandle<()>) -> Self {
        Self { claim, task }
    }

    pub fn collections(&self) -> &[Collection] {
        self.claim.collections()
    }

    /// False once the feed task has ended on its own
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Release the subscription
    pub fn unsubscribe(self) {
        tracing::info!("[Feed] Unsubscribing from {}", self.claim.key);
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
