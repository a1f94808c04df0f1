/**
 * Application State
 *
 * Shared by every handler through `State<AppState>`:
 *
 * - `store` - the snapshot file
 * - `cache` - TTL cache of read responses
 * - `changes` - broadcast channel feeding `/api/realtime`
 * - `config` - resolved server configuration
 *
 * Cloning is cheap; everything is behind `Arc` or is itself a handle.
 */

use crate::backend::catalog::cache::ResponseCache;
use crate::backend::realtime::ChangeBroadcast;
use crate::backend::server::config::ServerConfig;
use crate::backend::storage::store::SnapshotStore;
use axum::extract::FromRef;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the change event channel
pub const CHANGE_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub cache: Arc<ResponseCache>,
    pub changes: ChangeBroadcast,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store: Arc::new(SnapshotStore::new(config.data_path.clone())),
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            changes,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for ChangeBroadcast {
    fn from_ref(state: &AppState) -> Self {
        state.changes.clone()
    }
}
