use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::app::AppState;

/// GET / — the current leader as `{"name":"..."}`.
///
/// `name` is empty until the first leadership notification arrives. A
/// serialization failure is reported as a 500; it never affects scheduling.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Response {
    match serde_json::to_string(&state.leadership.snapshot()) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
