//! # Action Dispatcher
//!
//! The public write contract. `dispatch` validates the action, applies it
//! to the cache before returning and leaves the remote write to the engine's
//! writer task. It never blocks on the network and never fails: invalid
//! actions and transport failures end up in the engine's error log.
//!
//! Photo updates are not an action; photos are only added or deleted.

use crate::client::engine::SyncEngine;
use crate::shared::models::{Collection, Member, Mutation, Photo, Record};

/// A user intent against the synchronized collections
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddMember(Member),
    UpdateMember(Member),
    DeleteMember(String),
    AddPhoto(Photo),
    DeletePhoto(String),
    /// Reconcile one collection, or both when `None`
    Refresh(Option<Collection>),
}

impl Action {
    /// Mutation for write actions, `None` for refresh requests
    pub fn into_mutation(self) -> Option<Mutation> {
        match self {
            Action::AddMember(member) => Some(Mutation::Insert(Record::Member(member))),
            Action::UpdateMember(member) => Some(Mutation::Update(Record::Member(member))),
            Action::DeleteMember(id) => Some(Mutation::Delete {
                collection: Collection::Members,
                id,
            }),
            Action::AddPhoto(photo) => Some(Mutation::Insert(Record::Photo(photo))),
            Action::DeletePhoto(id) => Some(Mutation::Delete {
                collection: Collection::Photos,
                id,
            }),
            Action::Refresh(_) => None,
        }
    }
}

impl SyncEngine {
    /// Apply `action` optimistically and sync it in the background
    pub fn dispatch(&self, action: Action) {
        if let Action::Refresh(target) = action {
            match target {
                Some(collection) => self.notify_external_change(collection),
                None => Collection::ALL
                    .into_iter()
                    .for_each(|collection| self.notify_external_change(collection)),
            }
            return;
        }

        let Some(mutation) = action.into_mutation() else {
            return;
        };

        if let Err(e) = check(&mutation) {
            tracing::warn!("[Sync] Rejected {} on {}: {}", mutation.id(), mutation.collection(), e);
            self.record_error(Some(mutation.collection()), e);
            return;
        }

        self.submit(mutation);
    }
}

fn check(mutation: &Mutation) -> Result<(), String> {
    match mutation {
        Mutation::Insert(record) | Mutation::Update(record) => {
            record.validate().map_err(|e| e.to_string())
        }
        Mutation::Delete { id, .. } if id.trim().is_empty() => Err("id is required".to_string()),
        Mutation::Delete { .. } => Ok(()),
    }
}
