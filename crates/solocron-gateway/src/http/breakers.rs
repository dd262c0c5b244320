use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::sync::Arc;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::app::AppState;
use solocron_dispatch::BreakerSnapshot;

/// GET /breakers — point-in-time state of every breaker.
pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.breakers.snapshot())
}

/// GET /breakers/stream — SSE feed of breaker state transitions.
///
/// Opens with a `snapshot` event carrying the current state of every
/// breaker, then streams one `transition` event per state change. A lagging
/// client skips events rather than slowing the dispatchers down.
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let first = Event::default()
        .event("snapshot")
        .json_data(state.breakers.snapshot());

    let live = BroadcastStream::new(state.breakers.subscribe()).filter_map(|item| {
        item.ok()
            .map(|ev| Event::default().event("transition").json_data(&ev))
    });

    Sse::new(tokio_stream::once(first).chain(live)).keep_alive(KeepAlive::default())
}
