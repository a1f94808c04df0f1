//! # Collection Cache
//!
//! In-memory copy of each tracked collection plus its load status. Every
//! operation is synchronous and total: updating or deleting an unknown id is
//! a no-op, and inserting an id that already exists replaces the entity.
//!
//! The cache is owned by the sync engine. Readers get a cloned
//! [`CacheStore`] and never mutate the live one.

use crate::shared::models::{self, Collection, Entity, Member, Mutation, Photo, Record, Records};
use chrono::{DateTime, Utc};

/// Items and status of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCache<T: Entity> {
    items: Vec<T>,
    loading: bool,
    last_refreshed: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl<T: Entity> Default for CollectionCache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            last_refreshed: None,
            error: None,
        }
    }
}

impl<T: Entity> CollectionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// When the last successful full load finished
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace everything with an authoritative load
    pub fn set_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.loading = false;
        self.error = None;
        self.last_refreshed = Some(Utc::now());
    }

    pub fn apply_insert(&mut self, item: T) {
        models::upsert(&mut self.items, item);
    }

    pub fn apply_update(&mut self, item: T) -> bool {
        models::replace(&mut self.items, item)
    }

    pub fn apply_delete(&mut self, id: &str) -> bool {
        models::remove(&mut self.items, id)
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    /// Record a failure; items are kept so the UI can show stale data
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Both collection caches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStore {
    pub members: CollectionCache<Member>,
    pub photos: CollectionCache<Photo>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an optimistic local mutation
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Insert(Record::Member(m)) => self.members.apply_insert(m.clone()),
            Mutation::Insert(Record::Photo(p)) => self.photos.apply_insert(p.clone()),
            Mutation::Update(Record::Member(m)) => {
                self.members.apply_update(m.clone());
            }
            Mutation::Update(Record::Photo(p)) => {
                self.photos.apply_update(p.clone());
            }
            Mutation::Delete { collection: Collection::Members, id } => {
                self.members.apply_delete(id);
            }
            Mutation::Delete { collection: Collection::Photos, id } => {
                self.photos.apply_delete(id);
            }
        }
    }

    /// Copy creation timestamps of already cached entities onto a write so
    /// the remote copy keeps them too
    pub fn keep_immutable(&self, mutation: &mut Mutation) {
        match mutation {
            Mutation::Insert(Record::Member(m)) | Mutation::Update(Record::Member(m)) => {
                if let Some(existing) = self.members.get(&m.id) {
                    m.keep_immutable(existing);
                }
            }
            Mutation::Insert(Record::Photo(p)) | Mutation::Update(Record::Photo(p)) => {
                if let Some(existing) = self.photos.get(&p.id) {
                    p.keep_immutable(existing);
                }
            }
            Mutation::Delete { .. } => {}
        }
    }

    /// Overwrite one collection with a fetch result
    pub fn replace(&mut self, records: Records) {
        match records {
            Records::Members(items) => self.members.set_all(items),
            Records::Photos(items) => self.photos.set_all(items),
        }
    }

    pub fn records(&self, collection: Collection) -> Records {
        match collection {
            Collection::Members => Records::Members(self.members.items().to_vec()),
            Collection::Photos => Records::Photos(self.photos.items().to_vec()),
        }
    }

    pub fn mark_loading(&mut self, collection: Collection) {
        match collection {
            Collection::Members => self.members.mark_loading(),
            Collection::Photos => self.photos.mark_loading(),
        }
    }

    pub fn mark_error(&mut self, collection: Collection, message: impl Into<String>) {
        match collection {
            Collection::Members => self.members.mark_error(message),
            Collection::Photos => self.photos.mark_error(message),
        }
    }

    pub fn is_loading(&self, collection: Collection) -> bool {
        match collection {
            Collection::Members => self.members.is_loading(),
            Collection::Photos => self.photos.is_loading(),
        }
    }

    pub fn error(&self, collection: Collection) -> Option<&str> {
        match collection {
            Collection::Members => self.members.error(),
            Collection::Photos => self.photos.error(),
        }
    }

    pub fn last_refreshed(&self, collection: Collection) -> Option<DateTime<Utc>> {
        match collection {
            Collection::Members => self.members.last_refreshed(),
            Collection::Photos => self.photos.last_refreshed(),
        }
    }

    /// Empty both collections, e.g. on teardown
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
