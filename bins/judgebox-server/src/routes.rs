use crate::handlers;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute_code))
        .route("/health", get(handlers::health_check))
        // Lift axum's 2 MB default so the handler's own payload guards
        // (1 MB source, 10 MB per input) are the governing limits.
        .layer(DefaultBodyLimit::max(handlers::MAX_REQUEST_BODY_BYTES))
}
