//! Route table.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the control surface router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/status", get(handlers::status))
        .route("/scheduler/start", post(handlers::scheduler_start))
        .route("/scheduler/stop", post(handlers::scheduler_stop))
        .route("/run/trigger", post(handlers::trigger_run))
        .route("/runs/recent", get(handlers::recent_runs))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
