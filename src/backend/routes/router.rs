/**
 * Router Configuration
 *
 * Assembles the API routes, the permissive CORS layer the admin panel and
 * public pages rely on, and a JSON 404 fallback.
 */

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;
use axum::{http::StatusCode, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = configure_api_routes(Router::new());

    router
        .fallback(|| async { BackendError::handler(StatusCode::NOT_FOUND, "Not Found") })
        .layer(cors)
        .with_state(app_state)
}
