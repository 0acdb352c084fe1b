pub mod snapshot;
pub mod stream;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(snapshot::get_snapshot))
        .route("/stream", get(stream::stream_deltas))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
