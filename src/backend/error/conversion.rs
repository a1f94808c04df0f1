/**
 * Error to HTTP response conversion
 *
 * Every `BackendError` becomes a JSON body of the form
 * `{"error": "<message>", "status": <code>}` with the matching status.
 */

use crate::backend::error::types::BackendError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Storage] Request failed: {}", message);
        } else {
            tracing::warn!("[Storage] Request rejected: {}", message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
