/**
 * Server Initialization
 *
 * Builds `AppState` from the resolved configuration and wires the router.
 * The snapshot file is read once up front so a corrupt file is reported at
 * startup instead of on the first request; the server still starts.
 */

use crate::backend::routes::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use axum::Router;

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!(
        "[Storage] Initializing showcase server with data file {}",
        config.data_path.display()
    );

    let app_state = AppState::new(config);

    match app_state.store.load().await {
        Ok(snapshot) => tracing::info!(
            "[Storage] Loaded {} members and {} photos",
            snapshot.members.len(),
            snapshot.photos.len()
        ),
        Err(e) => tracing::warn!("[Storage] Could not read stored snapshot: {}", e),
    }

    create_router(app_state)
}
