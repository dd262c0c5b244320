use axum::{routing::get, Router};
use std::sync::Arc;

use solocron_core::LeadershipState;
use solocron_dispatch::{BreakerRegistry, DispatchMetrics};

/// Shared state for the status/metrics surface — read-only views over the
/// scheduler's collaborators.
pub struct AppState {
    pub leadership: Arc<LeadershipState>,
    pub breakers: Arc<BreakerRegistry>,
    pub metrics: Arc<DispatchMetrics>,
}

impl AppState {
    pub fn new(
        leadership: Arc<LeadershipState>,
        breakers: Arc<BreakerRegistry>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            leadership,
            breakers,
            metrics,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::status::status_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/metrics", get(crate::http::metrics::metrics_handler))
        .route("/breakers", get(crate::http::breakers::snapshot_handler))
        .route(
            "/breakers/stream",
            get(crate::http::breakers::stream_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
