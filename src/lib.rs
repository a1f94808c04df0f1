//! Showcase Sync - Main Library
//!
//! Data synchronization for a community showcase site: a members directory
//! and an image gallery kept consistent with a remote store across
//! optimistic local writes, change notifications, polling and refocus.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between client and server
//!   - Member, photo and snapshot models
//!   - Change events
//!   - Configuration and shared error types
//!
//! - **`client`** - The synchronization core
//!   - Transport adapters (local proxy, remote table store, in-memory)
//!   - Retry policy and change feeds
//!   - Collection cache, sync engine and action dispatcher
//!
//! - **`backend`** - Storage server (only compiled with the `server` feature)
//!   - Whole-snapshot JSON endpoint backed by a file
//!   - Members and paginated gallery reads with a short TTL cache
//!   - Server-sent change stream
//!
//! # Feature Flags
//!
//! - **`server`** - enables `backend` and the `showcase-server` binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use showcase_sync::client::{Action, ChangeFeed, MemoryTransport, SyncEngine};
//! use showcase_sync::shared::{Photo, SyncConfig};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(MemoryTransport::default());
//! let feed: Arc<dyn ChangeFeed> = Arc::new(store.change_feed());
//! let engine = SyncEngine::new(SyncConfig::default(), store, Some(feed));
//! engine.init().await.ok();
//!
//! engine.dispatch(Action::AddPhoto(Photo::new("Dawn", "", "Lee", "https://img/dawn.jpg")));
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::error` for validation and serialization failures
//! - `client::error` for transport, subscription and lifecycle failures
//! - `backend::error` for HTTP responses
//!
//! The sync engine never surfaces transport failures as panics or returned
//! errors; they become cache and status state.

/// Shared types and data structures
pub mod shared;

/// Data synchronization core
pub mod client;

/// Storage server
#[cfg(feature = "server")]
pub mod backend;
