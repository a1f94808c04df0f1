//! Client Module
//!
//! The data-synchronization core that keeps an in-memory view of the
//! members and photo collections consistent with a remote store.
//!
//! # Components
//!
//! Leaves first:
//!
//! - **`transport`** - uniform CRUD over the local proxy or the remote table store
//! - **`retry`** - bounded retry with backoff for idempotent reads
//! - **`change_feed`** - remote change notifications and subscription lifetime
//! - **`cache`** - per-collection items plus load status
//! - **`engine`** - orchestration: initial load, triggers, optimistic writes
//! - **`dispatcher`** - the public `dispatch(action)` contract
//!
//! Plus two helpers outside the engine: `api::CatalogClient` for the public
//! read endpoints and `media::MediaUploader` for image uploads.
//!
//! # Example
//!
//! ```rust,no_run
//! use showcase_sync::client::{config::load_config, Action, SyncEngine};
//! use showcase_sync::shared::Member;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::from_config(load_config()?)?;
//! engine.init().await?;
//!
//! engine.dispatch(Action::AddMember(Member::new("Ada", "Engineer", "", "")));
//! println!("{} members", engine.members().len());
//!
//! engine.teardown();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod change_feed;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod media;
pub mod optimistic;
pub mod retry;
pub mod transport;

pub use api::CatalogClient;
pub use cache::{CacheStore, CollectionCache};
pub use change_feed::{
    BroadcastChangeFeed, ChangeCallback, ChangeFeed, SseChangeFeed, SubscriptionHandle,
    TableChangeFeed,
};
pub use dispatcher::Action;
pub use engine::{FeedStatus, SyncEngine, SyncErrorRecord, SyncState, SyncStatus};
pub use error::{EngineError, Operation, SubscriptionError, TransportCause, TransportError};
pub use media::MediaUploader;
pub use retry::{with_retry, RetryPolicy};
pub use transport::{
    build_transport, LocalProxyTransport, MemoryTransport, RemoteTableTransport, Transport,
};
