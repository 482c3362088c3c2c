//! `POST /predict`

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;

use crate::models::response::PredictResponse;
use crate::services::pipeline::DiagnosisRequest;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// Diagnose an uploaded leaf image.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<PredictResponse>> {
    let request = read_upload(multipart?).await?;
    predict_upload(&state, request).await.map(Json)
}

/// Run the pipeline for an already extracted upload.
pub async fn predict_upload(state: &AppState, request: DiagnosisRequest) -> AppResult<PredictResponse> {
    let outcome = state
        .service()
        .diagnose(request, state.request_token())
        .await?;
    Ok(outcome.into_response())
}

/// Pull the `file` field out of the form; other fields are skipped.
async fn read_upload(mut multipart: Multipart) -> AppResult<DiagnosisRequest> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(DiagnosisRequest::new(bytes, filename));
    }
    Err(AppError::validation(format!(
        "No file uploaded; expected multipart field '{}'",
        UPLOAD_FIELD
    )))
}
