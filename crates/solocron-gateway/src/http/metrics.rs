use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::app::AppState;

/// GET /metrics — Prometheus text exposition of the dispatch metrics.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let body = String::from_utf8(buffer)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
        .into_response())
}
