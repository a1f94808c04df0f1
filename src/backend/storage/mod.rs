//! Snapshot persistence and the local proxy endpoint

pub mod handlers;
pub mod store;

pub use store::SnapshotStore;
