/**
 * API Routes
 *
 * ## Storage proxy
 * - `GET /api/data` - whole snapshot
 * - `POST /api/data` - replace the whole snapshot
 *
 * ## Catalog
 * - `GET /api/members` - members ordered by name
 * - `GET /api/gallery` - paginated photos
 *
 * ## Realtime
 * - `GET /api/realtime` - change event stream (requires `Subscribe`)
 * - `GET /api/realtime-init` - flush cached read responses
 */

use crate::backend::catalog::handlers::{handle_get_gallery, handle_get_members};
use crate::backend::realtime::subscription::{handle_realtime_init, handle_realtime_subscription};
use crate::backend::server::state::AppState;
use crate::backend::storage::handlers::{handle_get_data, handle_post_data};
use axum::{routing::get, Router};

pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/data", get(handle_get_data).post(handle_post_data))
        .route("/api/members", get(handle_get_members))
        .route("/api/gallery", get(handle_get_gallery))
        .route("/api/realtime", get(handle_realtime_subscription))
        .route("/api/realtime-init", get(handle_realtime_init))
}
