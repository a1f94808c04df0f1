/**
 * Change Event Broadcasting
 *
 * Every accepted write publishes one `ChangeEvent` per changed collection on
 * a `tokio::sync::broadcast` channel. Each `/api/realtime` subscriber holds
 * its own receiver and gets a copy of every event.
 */

use crate::shared::event::ChangeEvent;
use tokio::sync::broadcast;

/// Sender half shared through `AppState`
pub type ChangeBroadcast = broadcast::Sender<ChangeEvent>;

/// Broadcast a change event to all subscribers
///
/// Returns the number of subscribers that received it (0 when nobody is
/// listening, which is not an error).
pub fn broadcast_change(broadcast_tx: &ChangeBroadcast, event: ChangeEvent) -> usize {
    let collection = event.collection;
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::info!(
                "[Realtime] {} change broadcast to {} subscribers",
                collection,
                subscriber_count
            );
            subscriber_count
        }
        Err(_) => {
            tracing::debug!("[Realtime] No subscribers for {} change", collection);
            0
        }
    }
}
