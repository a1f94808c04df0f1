//! Background tasks owned by the engine: per-collection writers and the
//! three refresh triggers. All of them are aborted on teardown.

use super::{EngineInner, FeedStatus, WriteJob};
use crate::client::change_feed::ChangeCallback;
use crate::client::retry::{with_retry, RetryPolicy};
use crate::shared::models::Collection;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Forward queued writes for one collection, strictly in order
pub(super) async fn run_writer(
    inner: Arc<EngineInner>,
    mut queue: mpsc::UnboundedReceiver<WriteJob>,
) {
    while let Some(job) = queue.recv().await {
        if !inner.is_active() {
            break;
        }
        inner.write(job).await;
    }
}

/// Fallback poll, refreshing regardless of feed health
pub(super) async fn run_poll(inner: Arc<EngineInner>) {
    let period = inner.config.poll_interval();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately and the initial load just ran
    ticker.tick().await;

    tracing::info!("[Sync] Polling every {:?}", period);
    loop {
        ticker.tick().await;
        if !inner.is_active() {
            break;
        }
        inner.request_refresh_all();
    }
}

/// Refresh both collections whenever the page becomes visible again
pub(super) async fn run_visibility(inner: Arc<EngineInner>, mut visible: watch::Receiver<bool>) {
    let mut was_visible = *visible.borrow_and_update();
    while visible.changed().await.is_ok() {
        let now_visible = *visible.borrow_and_update();
        if now_visible && !was_visible && inner.is_active() {
            tracing::debug!("[Sync] Became visible, refreshing");
            inner.request_refresh_all();
        }
        was_visible = now_visible;
    }
}

/// Subscribe to the change feed with a fixed retry delay, falling back to
/// polling only when every attempt fails
pub(super) async fn run_subscribe(inner: Arc<EngineInner>) {
    let Some(feed) = inner.feed.clone() else {
        tracing::info!("[Sync] No change feed configured, polling only");
        inner.set_feed_status(FeedStatus::PollingOnly);
        return;
    };

    inner.set_feed_status(FeedStatus::Connecting);

    let weak: Weak<EngineInner> = Arc::downgrade(&inner);
    let on_change: ChangeCallback = Arc::new(move |collection: Collection| {
        if let Some(inner) = weak.upgrade() {
            inner.request_refresh(collection);
        }
    });

    let policy = RetryPolicy::fixed(
        inner.config.subscribe_attempts,
        inner.config.subscribe_delay(),
    );
    let result = with_retry(&policy, "subscribe change feed", || {
        feed.subscribe(&Collection::ALL, Arc::clone(&on_change))
    })
    .await;

    if !inner.is_active() {
        return;
    }

    match result {
        Ok(handle) => {
            {
                let mut slot = inner.subscription.lock();
                // Teardown flips `active` before it empties this slot
                if !inner.is_active() {
                    handle.unsubscribe();
                    return;
                }
                *slot = Some(handle);
            }
            tracing::info!("[Sync] Change feed '{}' live", feed.name());
            inner.set_feed_status(FeedStatus::Live);
        }
        Err(e) => {
            tracing::warn!("[Sync] Giving up on change feed, polling only: {}", e);
            inner.state.write().errors.push(None, e.to_string());
            inner.set_feed_status(FeedStatus::PollingOnly);
        }
    }
}
