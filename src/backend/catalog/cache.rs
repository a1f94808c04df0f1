/**
 * Response cache for the read endpoints
 *
 * Absorbs read bursts on `/api/members` and `/api/gallery` by keeping each
 * serialized response for a short fixed TTL. Entries are keyed by
 * collection plus a per-request suffix (the gallery page), so a write to
 * one collection only evicts that collection's entries.
 */

use crate::shared::models::Collection;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub collection: Collection,
    pub variant: String,
}

impl CacheKey {
    pub fn new(collection: Collection, variant: impl Into<String>) -> Self {
        Self {
            collection,
            variant: variant.into(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh cached value, if any
    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: serde_json::Value) {
        self.entries.write().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry for one collection
    pub fn invalidate(&self, collection: Collection) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.collection != collection);
        before - entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
