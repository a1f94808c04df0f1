//! # Sync Engine
//!
//! Keeps the collection cache consistent with the configured transport.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> Loading -> Ready <-> Refreshing
//!                     |         |          |
//!                     +-----> Error <------+
//!                               |
//!                               +--> Loading (next trigger)
//! ```
//!
//! `init` loads both collections in parallel under the retry policy, then
//! starts the refresh triggers whether or not that load succeeded:
//!
//! - the change-feed subscription (retried with a fixed delay, then given up
//!   in favour of polling)
//! - the fallback poll timer
//! - the visibility listener fed by [`SyncEngine::notify_visibility`]
//!
//! Every trigger goes through a per-collection [`RefreshGate`], so a burst of
//! triggers during an in-flight fetch costs exactly one extra fetch.
//!
//! ## Local writes
//!
//! Mutations are applied to the cache immediately and queued on the
//! collection's writer task, which forwards them to the transport one at a
//! time in dispatch order with no retry. Once a write settles the engine
//! requests a reconciliation refresh, which reverts a rejected write. Writes
//! still waiting for the transport are replayed over every refresh result.
//!
//! ## Teardown
//!
//! `teardown` (also run on drop) flips the session's `active` flag, aborts
//! every background task and releases the feed subscription. Every async
//! path checks `active` before touching the cache, so nothing written after
//! teardown can land in it.

mod coalesce;
mod status;
mod triggers;

pub use coalesce::RefreshGate;
pub use status::{FeedStatus, SyncErrorRecord, SyncState, SyncStatus};

use crate::client::cache::CacheStore;
use crate::client::change_feed::{ChangeFeed, SseChangeFeed, SubscriptionHandle, TableChangeFeed};
use crate::client::error::{EngineError, TransportError};
use crate::client::optimistic::PendingMutations;
use crate::client::retry::{with_retry, RetryPolicy};
use crate::client::transport::{build_transport, Transport};
use crate::shared::config::{ConfigError, SyncConfig, TransportMode};
use crate::shared::models::{Collection, Member, Mutation, Photo, Records};
use parking_lot::{Mutex, RwLock};
use status::ErrorLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A queued remote write
#[derive(Debug)]
pub(crate) struct WriteJob {
    pending_id: Uuid,
    mutation: Mutation,
}

#[derive(Debug)]
struct EngineState {
    phase: SyncState,
    feed: FeedStatus,
    cache: CacheStore,
    pending: PendingMutations,
    errors: ErrorLog,
    refreshes_in_flight: usize,
}

#[derive(Debug)]
struct WriteQueues {
    members: mpsc::UnboundedSender<WriteJob>,
    photos: mpsc::UnboundedSender<WriteJob>,
}

#[derive(Debug)]
struct WriteReceivers {
    members: mpsc::UnboundedReceiver<WriteJob>,
    photos: mpsc::UnboundedReceiver<WriteJob>,
}

#[derive(Debug)]
pub(crate) struct EngineInner {
    config: SyncConfig,
    transport: Arc<dyn Transport>,
    feed: Option<Arc<dyn ChangeFeed>>,
    active: AtomicBool,
    initialized: AtomicBool,
    torn_down: AtomicBool,
    state: RwLock<EngineState>,
    revision: watch::Sender<u64>,
    visible: watch::Sender<bool>,
    members_gate: RefreshGate,
    photos_gate: RefreshGate,
    writers: WriteQueues,
    receivers: Mutex<Option<WriteReceivers>>,
    runtime: Mutex<Option<Handle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

/// The data-synchronization core
#[derive(Debug)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Create an engine over an explicit transport and optional change feed
    pub fn new(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        feed: Option<Arc<dyn ChangeFeed>>,
    ) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("[Sync] Starting with invalid configuration: {}", e);
        }
        let (members_tx, members_rx) = mpsc::unbounded_channel();
        let (photos_tx, photos_rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        let (visible, _) = watch::channel(true);

        let state = EngineState {
            phase: SyncState::Uninitialized,
            feed: FeedStatus::Inactive,
            cache: CacheStore::new(),
            pending: PendingMutations::new(),
            errors: ErrorLog::new(config.max_error_records),
            refreshes_in_flight: 0,
        };

        let inner = EngineInner {
            config,
            transport,
            feed,
            active: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            state: RwLock::new(state),
            revision,
            visible,
            members_gate: RefreshGate::new(),
            photos_gate: RefreshGate::new(),
            writers: WriteQueues {
                members: members_tx,
                photos: photos_tx,
            },
            receivers: Mutex::new(Some(WriteReceivers {
                members: members_rx,
                photos: photos_rx,
            })),
            runtime: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Build the transport and change feed from configuration.
    ///
    /// A configured realtime URL selects the event-stream feed. Otherwise
    /// remote-table mode listens on the store's realtime websocket and local
    /// mode polls only.
    pub fn from_config(config: SyncConfig) -> Result<Self, ConfigError> {
        let transport = build_transport(&config)?;
        let feed: Option<Arc<dyn ChangeFeed>> = match (&config.realtime_url, &config.remote) {
            (Some(url), _) => {
                let sse = SseChangeFeed::new(reqwest::Client::new(), url.clone());
                Some(Arc::new(sse) as Arc<dyn ChangeFeed>)
            }
            (None, Some(remote)) if config.mode == TransportMode::RemoteTable => {
                Some(Arc::new(TableChangeFeed::new(remote)?) as Arc<dyn ChangeFeed>)
            }
            _ => None,
        };
        Ok(Self::new(config, transport, feed))
    }

    /// Load both collections, then start the change feed, the poll timer
    /// and the visibility listener.
    ///
    /// A failed initial load is not an error here: the engine ends up in
    /// [`SyncState::Error`] and the triggers retry it.
    pub async fn init(&self) -> Result<(), EngineError> {
        let inner = &self.inner;
        if inner.torn_down.load(Ordering::SeqCst) {
            return Err(EngineError::TornDown);
        }
        if inner.initialized.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyInitialized);
        }

        inner.active.store(true, Ordering::SeqCst);
        *inner.runtime.lock() = Some(Handle::current());
        tracing::info!(
            "[Sync] Initializing with {} transport",
            inner.transport.name()
        );

        if let Some(receivers) = inner.receivers.lock().take() {
            let members = tokio::spawn(triggers::run_writer(Arc::clone(inner), receivers.members));
            let photos = tokio::spawn(triggers::run_writer(Arc::clone(inner), receivers.photos));
            inner.tasks.lock().extend([members, photos]);
        }

        futures_util::future::join(
            inner.refresh_and_wait(Collection::Members),
            inner.refresh_and_wait(Collection::Photos),
        )
        .await;

        if !inner.is_active() {
            return Err(EngineError::TornDown);
        }

        let phase = inner.state.read().phase;
        match phase {
            SyncState::Error => {
                tracing::warn!("[Sync] Initial load failed, waiting for next trigger");
            }
            _ => tracing::info!("[Sync] Initial load complete"),
        }

        let poll = tokio::spawn(triggers::run_poll(Arc::clone(inner)));
        let visibility = tokio::spawn(triggers::run_visibility(
            Arc::clone(inner),
            inner.visible.subscribe(),
        ));
        let subscribe = tokio::spawn(triggers::run_subscribe(Arc::clone(inner)));
        inner.tasks.lock().extend([poll, visibility, subscribe]);

        Ok(())
    }

    /// End the session: release the subscription, stop every timer and
    /// listener, and drop the cache contents. Idempotent.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    /// Name of the configured change feed, `None` when polling only
    pub fn feed_name(&self) -> Option<&'static str> {
        self.inner.feed.as_ref().map(|feed| feed.name())
    }

    pub fn state(&self) -> SyncState {
        self.inner.state.read().phase
    }

    pub fn status(&self) -> SyncStatus {
        let state = self.inner.state.read();
        SyncStatus {
            state: state.phase,
            feed: state.feed,
            errors: state.errors.to_vec(),
            pending_writes: state.pending.len(),
            revision: *self.inner.revision.borrow(),
        }
    }

    /// Drain the error log
    pub fn take_errors(&self) -> Vec<SyncErrorRecord> {
        self.inner.state.write().errors.drain()
    }

    /// Copy of the current cache for readers
    pub fn snapshot(&self) -> CacheStore {
        self.inner.state.read().cache.clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.inner.state.read().cache.members.items().to_vec()
    }

    pub fn photos(&self) -> Vec<Photo> {
        self.inner.state.read().cache.photos.items().to_vec()
    }

    /// Revision counter bumped on every cache change
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Refresh one collection (or both) and wait until the cache reflects a
    /// fetch that started after this call.
    pub async fn refresh(&self, collection: Option<Collection>) {
        match collection {
            Some(collection) => self.inner.refresh_and_wait(collection).await,
            None => {
                futures_util::future::join(
                    self.inner.refresh_and_wait(Collection::Members),
                    self.inner.refresh_and_wait(Collection::Photos),
                )
                .await;
            }
        }
    }

    /// Refocus listener input. A hidden to visible transition refreshes
    /// both collections.
    pub fn notify_visibility(&self, visible: bool) {
        self.inner.visible.send_replace(visible);
    }

    /// Out-of-band "this collection changed" notification (another tab's
    /// storage event, a backend webhook)
    pub fn notify_external_change(&self, collection: Collection) {
        tracing::debug!("[Sync] External change reported for {}", collection);
        self.inner.request_refresh(collection);
    }

    /// Apply a local mutation optimistically and queue its remote write
    pub(crate) fn submit(&self, mutation: Mutation) {
        self.inner.submit(mutation);
    }

    pub(crate) fn record_error(&self, collection: Option<Collection>, message: String) {
        self.inner.state.write().errors.push(collection, message);
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl EngineInner {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn gate(&self, collection: Collection) -> &RefreshGate {
        match collection {
            Collection::Members => &self.members_gate,
            Collection::Photos => &self.photos_gate,
        }
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn load_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.config.load_attempts, self.config.load_initial_delay())
    }

    fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let runtime = self.runtime.lock().clone();
        match runtime {
            Some(handle) => {
                handle.spawn(future);
            }
            None => tracing::debug!("[Sync] Engine not initialized, dropping background work"),
        }
    }

    /// Fire-and-forget refresh, coalesced with any in-flight one
    fn request_refresh(self: &Arc<Self>, collection: Collection) {
        if !self.is_active() {
            return;
        }
        if self.gate(collection).try_begin() {
            let inner = Arc::clone(self);
            self.spawn(async move { inner.drive_refresh(collection).await });
        } else {
            tracing::debug!("[Sync] Refresh of {} already in flight, coalescing", collection);
        }
    }

    fn request_refresh_all(self: &Arc<Self>) {
        for collection in Collection::ALL {
            self.request_refresh(collection);
        }
    }

    async fn refresh_and_wait(self: &Arc<Self>, collection: Collection) {
        if !self.is_active() {
            return;
        }
        let gate = self.gate(collection);
        if gate.try_begin() {
            self.drive_refresh(collection).await;
        } else {
            gate.wait_idle().await;
        }
    }

    /// Run passes until no trigger arrived during the last one
    async fn drive_refresh(&self, collection: Collection) {
        loop {
            self.refresh_once(collection).await;
            if !self.gate(collection).finish() {
                break;
            }
            tracing::debug!("[Sync] Re-running coalesced refresh of {}", collection);
        }
    }

    async fn refresh_once(&self, collection: Collection) {
        if !self.is_active() {
            return;
        }

        {
            let mut state = self.state.write();
            state.refreshes_in_flight += 1;
            state.cache.mark_loading(collection);
            state.phase = match state.phase {
                SyncState::Ready | SyncState::Refreshing => SyncState::Refreshing,
                _ => SyncState::Loading,
            };
        }
        self.bump_revision();

        let policy = self.load_policy();
        let label = format!("fetch {}", collection);
        let result = with_retry(&policy, &label, || self.transport.fetch_all(collection)).await;

        if !self.is_active() {
            tracing::debug!("[Sync] Discarding {} fetch result after teardown", collection);
            return;
        }

        self.finish_refresh(collection, result);
        self.bump_revision();
    }

    fn finish_refresh(&self, collection: Collection, result: Result<Records, TransportError>) {
        let mut state = self.state.write();
        state.refreshes_in_flight = state.refreshes_in_flight.saturating_sub(1);

        match result {
            Ok(records) => {
                tracing::debug!("[Sync] Loaded {} {}", records.len(), collection);
                let EngineState { cache, pending, .. } = &mut *state;
                cache.replace(records);
                let replayed = pending.reapply(cache, collection);
                if replayed > 0 {
                    tracing::debug!(
                        "[Sync] Replayed {} pending writes over {}",
                        replayed,
                        collection
                    );
                }
            }
            Err(e) => {
                tracing::error!("[Sync] Refresh of {} failed: {}", collection, e);
                state.cache.mark_error(collection, e.to_string());
                state.errors.push(Some(collection), e.to_string());
            }
        }

        if state.refreshes_in_flight == 0 {
            let failed = Collection::ALL
                .iter()
                .any(|c| state.cache.error(*c).is_some());
            state.phase = if failed { SyncState::Error } else { SyncState::Ready };
        }
    }

    fn submit(&self, mut mutation: Mutation) {
        if self.torn_down.load(Ordering::SeqCst) {
            tracing::warn!(
                "[Sync] Ignoring {} on {} after teardown",
                mutation.id(),
                mutation.collection()
            );
            return;
        }

        let collection = mutation.collection();
        let pending_id = {
            let mut state = self.state.write();
            state.cache.keep_immutable(&mut mutation);
            state.cache.apply(&mutation);
            state.pending.track(mutation.clone())
        };
        self.bump_revision();

        let queue = match collection {
            Collection::Members => &self.writers.members,
            Collection::Photos => &self.writers.photos,
        };
        if queue.send(WriteJob { pending_id, mutation }).is_err() {
            tracing::warn!("[Sync] Write queue for {} is closed", collection);
            self.state.write().pending.settle(pending_id);
        }
    }

    /// Forward one queued write and reconcile
    async fn write(self: &Arc<Self>, job: WriteJob) {
        let collection = job.mutation.collection();
        let result = self.transport.apply(&job.mutation).await;

        if !self.is_active() {
            return;
        }

        {
            let mut state = self.state.write();
            state.pending.settle(job.pending_id);
            if let Err(e) = &result {
                tracing::error!("[Sync] Write to {} failed, reconciling: {}", collection, e);
                state.cache.mark_error(collection, e.to_string());
                state.errors.push(Some(collection), e.to_string());
            }
        }
        if result.is_err() {
            self.bump_revision();
        }

        self.request_refresh(collection);
    }

    fn set_feed_status(&self, feed: FeedStatus) {
        self.state.write().feed = feed;
        self.bump_revision();
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.active.store(false, Ordering::SeqCst);

        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        if let Some(handle) = self.subscription.lock().take() {
            handle.unsubscribe();
        }

        {
            let mut state = self.state.write();
            state.feed = FeedStatus::Inactive;
            state.phase = SyncState::Uninitialized;
            state.pending.clear();
            state.cache.clear();
            state.refreshes_in_flight = 0;
        }
        self.bump_revision();
        tracing::info!("[Sync] Engine torn down");
    }
}
