/**
 * Change Stream Handler
 *
 * Server-Sent Events endpoint at `/api/realtime`. Clients receive one
 * `change` event per changed collection, carrying the `ChangeEvent` JSON:
 *
 * ```http
 * GET /api/realtime?collections=members HTTP/1.1
 * Subscribe: true
 *
 * HTTP/1.1 200 OK
 * Content-Type: text/event-stream
 *
 * event: change
 * data: {"collection":"members","kind":"bulk","timestamp":"..."}
 * ```
 *
 * # Filtering
 *
 * `collections` is a comma-separated list (`members`, `photos`, or the
 * alias `gallery`). Unknown names are ignored; no usable name means every
 * collection.
 *
 * # Connection Management
 *
 * Keep-alive comments are sent by axum. A lagging receiver skips the
 * dropped events and keeps streaming; the client treats any reconnect as
 * "refresh everything".
 */

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::models::Collection;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Default, Deserialize)]
pub struct RealtimeQuery {
    pub collections: Option<String>,
}

/// Parse the `collections` filter; `None` means all collections
pub fn parse_filter(raw: Option<&str>) -> Option<Vec<Collection>> {
    let parsed: Vec<Collection> = raw?
        .split(',')
        .filter_map(|name| name.parse().ok())
        .collect();
    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

/// Handle change stream subscription (GET /api/realtime)
pub async fn handle_realtime_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RealtimeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, BackendError> {
    if !headers.contains_key("subscribe") {
        tracing::warn!("[Realtime] Subscribe header missing");
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "Subscribe header required",
        ));
    }

    let filter = parse_filter(query.collections.as_deref());
    tracing::info!("[Realtime] New subscriber, filter {:?}", filter);

    let receiver = state.changes.subscribe();
    let stream = stream::unfold((receiver, filter), |(mut rx, filter)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(wanted) = &filter {
                        if !wanted.contains(&event.collection) {
                            continue;
                        }
                    }
                    let data = match serde_json::to_string(&event) {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                            continue;
                        }
                    };
                    let sse_event = Event::default().event("change").data(data);
                    return Some((Ok(sse_event), (rx, filter)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Realtime] Subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::warn!("[Realtime] Broadcast channel closed, ending stream");
                    return None;
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Flush every cached read response (GET /api/realtime-init)
///
/// Called by the admin panel after it connects, so the next reads observe
/// the latest stored state.
pub async fn handle_realtime_init(State(state): State<AppState>) -> Json<serde_json::Value> {
    let flushed = state.cache.clear();
    tracing::info!("[Realtime] Initialized, flushed {} cached responses", flushed);
    Json(serde_json::json!({
        "success": true,
        "message": "Realtime connections initialized",
    }))
}
