//! HTTP Routes
//!
//! Every route is served both at the root and under `/api`.

pub mod health;
pub mod predict;
pub mod register;
pub mod stats;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config().max_upload_bytes;

    let routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/test", get(health::liveness))
        .route("/predict", post(predict::predict))
        .route("/stats", get(stats::stats))
        .route("/register", post(register::register));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
