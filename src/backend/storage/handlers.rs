/**
 * Local proxy endpoint
 *
 * `GET /api/data` returns the whole stored snapshot and `POST /api/data`
 * replaces it. After a successful write, every collection whose contents
 * changed gets its cached read responses evicted and a change event
 * broadcast. Overwriting an unreadable file counts as changing both.
 */

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast_change;
use crate::backend::server::state::AppState;
use crate::shared::event::ChangeEvent;
use crate::shared::models::{Collection, Snapshot};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /api/data
pub async fn handle_get_data(
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, BackendError> {
    let snapshot = state.store.load().await?;
    Ok(Json(snapshot))
}

/// POST /api/data
pub async fn handle_post_data(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> Result<Json<Value>, BackendError> {
    for member in &snapshot.members {
        member.validate()?;
    }
    for photo in &snapshot.photos {
        photo.validate()?;
    }

    let changed = match state.store.replace(&snapshot).await? {
        Some(previous) => previous.changed_collections(&snapshot),
        None => Collection::ALL.to_vec(),
    };

    tracing::info!(
        "[Storage] Snapshot saved ({} members, {} photos), changed: {:?}",
        snapshot.members.len(),
        snapshot.photos.len(),
        changed
    );

    for collection in changed {
        state.cache.invalidate(collection);
        broadcast_change(&state.changes, ChangeEvent::bulk(collection));
    }

    Ok(Json(json!({ "success": true })))
}
