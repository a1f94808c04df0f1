//! Scriptable transport for engine tests
//!
//! Wraps a `MemoryTransport` (so writes still publish change events) and
//! adds per-collection fetch counters, fetch failure injection, write
//! rejection and a gate that holds the next fetch open until released.

use async_trait::async_trait;
use showcase_sync::client::{
    BroadcastChangeFeed, MemoryTransport, Operation, Transport, TransportCause, TransportError,
};
use showcase_sync::shared::{Collection, Record, Records, Snapshot};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug)]
pub struct MockTransport {
    store: MemoryTransport,
    fetches: [AtomicUsize; 2],
    failing: [AtomicUsize; 2],
    writes: AtomicUsize,
    reject_writes: AtomicBool,
    hold: AtomicBool,
    entered: Notify,
    release: Notify,
}

fn slot(collection: Collection) -> usize {
    match collection {
        Collection::Members => 0,
        Collection::Photos => 1,
    }
}

impl MockTransport {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            store: MemoryTransport::new(initial),
            fetches: [AtomicUsize::new(0), AtomicUsize::new(0)],
            failing: [AtomicUsize::new(0), AtomicUsize::new(0)],
            writes: AtomicUsize::new(0),
            reject_writes: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// The backing store, for seeding data and inspecting writes
    pub fn store(&self) -> &MemoryTransport {
        &self.store
    }

    pub fn change_feed(&self) -> BroadcastChangeFeed {
        self.store.change_feed()
    }

    pub fn fetch_count(&self, collection: Collection) -> usize {
        self.fetches[slot(collection)].load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Fail the next `n` fetches of `collection` with a network error
    pub fn fail_next_fetches(&self, collection: Collection, n: usize) {
        self.failing[slot(collection)].store(n, Ordering::SeqCst);
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Block the next fetch until `release_fetch` is called
    pub fn hold_next_fetch(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Wait until a held fetch has started
    pub async fn wait_for_held_fetch(&self) {
        self.entered.notified().await;
    }

    pub fn release_fetch(&self) {
        self.release.notify_one();
    }

    fn check_write(
        &self,
        collection: Collection,
        operation: Operation,
    ) -> Result<(), TransportError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(TransportError::new(
                collection,
                operation,
                TransportCause::Rejected("write refused by test".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Records, TransportError> {
        self.fetches[slot(collection)].fetch_add(1, Ordering::SeqCst);

        if self.hold.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        let failing = &self.failing[slot(collection)];
        if failing
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::new(
                collection,
                Operation::FetchAll,
                TransportCause::Network("connection reset".to_string()),
            ));
        }

        self.store.fetch_all(collection).await
    }

    async fn insert(&self, record: Record) -> Result<(), TransportError> {
        self.check_write(record.collection(), Operation::Insert)?;
        self.store.insert(record).await
    }

    async fn update(&self, record: Record) -> Result<(), TransportError> {
        self.check_write(record.collection(), Operation::Update)?;
        self.store.update(record).await
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), TransportError> {
        self.check_write(collection, Operation::Remove)?;
        self.store.remove(collection, id).await
    }
}
