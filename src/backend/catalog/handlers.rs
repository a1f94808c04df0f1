/**
 * Public read endpoints
 *
 * - `GET /api/members` - all members ordered by name
 * - `GET /api/gallery?page=N&pageSize=M` - one page of photos, newest
 *   first, as `{items, totalCount}`
 *
 * Both are served from the response cache when a fresh entry exists.
 * `page` is 1-indexed and values below 1 are treated as 1; a missing or
 * non-positive `pageSize` uses the configured default.
 */

use crate::backend::catalog::cache::CacheKey;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::models::{self, Collection};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Largest page the gallery endpoint serves
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl GalleryQuery {
    /// Clamped `(page, page_size)`
    pub fn resolve(&self, default_page_size: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let page_size = match self.page_size {
            Some(size) if size >= 1 => size.min(i64::from(MAX_PAGE_SIZE)) as u32,
            _ => default_page_size,
        };
        (page, page_size)
    }
}

/// GET /api/members
pub async fn handle_get_members(
    State(state): State<AppState>,
) -> Result<Json<Value>, BackendError> {
    let key = CacheKey::new(Collection::Members, "all");
    if let Some(cached) = state.cache.get(&key) {
        tracing::debug!("[Storage] Serving members from cache");
        return Ok(Json(cached));
    }

    let mut members = state.store.load().await?.members;
    models::sort_members(&mut members);
    let body = serde_json::to_value(&members)?;
    state.cache.insert(key, body.clone());
    Ok(Json(body))
}

/// GET /api/gallery
pub async fn handle_get_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Value>, BackendError> {
    let (page, page_size) = query.resolve(state.config.gallery_page_size);
    let key = CacheKey::new(Collection::Photos, format!("page={}&pageSize={}", page, page_size));
    if let Some(cached) = state.cache.get(&key) {
        tracing::debug!("[Storage] Serving gallery page {} from cache", page);
        return Ok(Json(cached));
    }

    let mut photos = state.store.load().await?.photos;
    models::sort_photos(&mut photos);
    let total_count = photos.len();

    let offset = (page as usize - 1).saturating_mul(page_size as usize);
    let items: Vec<_> = photos.into_iter().skip(offset).take(page_size as usize).collect();

    let body = json!({
        "items": items,
        "totalCount": total_count,
    });
    state.cache.insert(key, body.clone());
    Ok(Json(body))
}
