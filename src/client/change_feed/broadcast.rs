//! In-process change feed over a tokio broadcast channel.
//!
//! Paired with `MemoryTransport`, which publishes a `ChangeEvent` for every
//! write. A receiver that falls behind loses events; it then reports every
//! subscribed collection as changed so nothing is missed.

use super::{ChangeCallback, ChangeFeed, SubscriptionHandle, SubscriptionRegistry};
use crate::client::error::SubscriptionError;
use crate::shared::event::ChangeEvent;
use crate::shared::models::Collection;
use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
    registry: SubscriptionRegistry,
}

impl BroadcastChangeFeed {
    pub fn new(sender: broadcast::Sender<ChangeEvent>) -> Self {
        Self {
            sender,
            registry: SubscriptionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Publish an event to every subscriber
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn subscribe(
        &self,
        collections: &[Collection],
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        let claim = self.registry.claim(collections)?;
        let set = claim.collections().to_vec();
        let mut receiver = self.sender.subscribe();

        tracing::info!("[Feed] Broadcast subscription for {:?}", set);

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if set.contains(&event.collection) {
                            tracing::debug!(
                                "[Feed] {:?} on {} ({:?})",
                                event.kind,
                                event.collection,
                                event.record_id
                            );
                            on_change(event.collection);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Feed] Receiver lagged by {} events, refreshing everything",
                            skipped
                        );
                        for collection in &set {
                            on_change(*collection);
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("[Feed] Broadcast channel closed");
                        break;
                    }
                }
            }
        });

        Ok(SubscriptionHandle::new(claim, task))
    }
}
