//! `GET /stats`

use axum::extract::State;
use axum::Json;

use crate::models::response::StatsResponse;
use crate::state::AppState;

/// Prediction statistics. An unreachable store yields a zeroed summary.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    match state.store().recent_stats().await {
        Ok(stats) => Json(StatsResponse::from_stats(stats, &state.config().model_accuracy)),
        Err(e) => {
            tracing::warn!("[Stats] Store unavailable, returning empty summary: {}", e);
            Json(StatsResponse::unavailable())
        }
    }
}
