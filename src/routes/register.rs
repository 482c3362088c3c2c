//! `POST /register`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::models::response::{RegisterRequest, RegisterResponse};
use crate::services::record_store::Registration;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Persist a user registration.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<RegisterResponse>> {
    let Json(request) = payload?;
    let registration = validate(request)?;
    let id = state.store().register(&registration).await?;
    tracing::info!("[Register] Stored registration {}", id);
    Ok(Json(RegisterResponse::success()))
}

fn validate(request: RegisterRequest) -> AppResult<Registration> {
    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    if !email.contains('@') {
        return Err(AppError::validation("email must contain '@'"));
    }
    Ok(Registration {
        name: name.to_string(),
        email: email.to_string(),
        phone: request.phone.trim().to_string(),
    })
}
