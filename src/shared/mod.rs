//! Shared Module
//!
//! Types shared between the sync client and the storage server. Everything
//! here is plain data designed for JSON transmission.

/// Members, photos and the whole-state snapshot
pub mod models;

/// Change notification events
pub mod event;

/// Shared error types
pub mod error;

/// Sync configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use models::{
    Collection, Entity, GalleryPage, Member, Mutation, Photo, Record, Records, Snapshot,
};
pub use event::{ChangeEvent, ChangeKind};
pub use error::SharedError;
pub use config::{ConfigError, RemoteConfig, SyncConfig, SyncConfigBuilder, TransportMode};
