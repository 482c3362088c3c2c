//! Liveness and readiness probes

use axum::extract::State;
use axum::Json;

use crate::models::response::{HealthResponse, LivenessResponse, MessageResponse};
use crate::state::AppState;

/// Readiness: reports store reachability and the configured model.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.store().is_healthy().await;
    let client = state.service().client();
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
        provider: client.name().to_string(),
        model: client.model().to_string(),
        ..Default::default()
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
        message: "Plant health API is responding.".to_string(),
    })
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Plant Health Detection System API is running.".to_string(),
    })
}
