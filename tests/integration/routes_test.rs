//! Route Handler Integration Tests
//!
//! Handlers are called directly with `State` / `Json` extractors.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use plant_health_server::routes::{health, predict, register, stats};
use plant_health_server::{DiagnosisRequest, PredictionStatus, RegisterRequest};
use plant_health_vision::VisionError;

use crate::support::{answer, memory_state, Script, PNG};

#[tokio::test]
async fn test_stats_counts_successful_predictions() {
    let (state, _store) = memory_state(answer("Tomato___Late_blight", 0.9));

    for i in 0..3 {
        predict::predict_upload(&state, DiagnosisRequest::new(PNG, format!("t{}.png", i)))
            .await
            .unwrap();
    }

    let Json(body) = stats::stats(State(state)).await;
    assert_eq!(body.total_predictions, 3);
    assert_eq!(body.model_accuracy.as_deref(), Some("95%"));
    assert_eq!(
        body.common_diseases,
        Some(vec!["Tomato Late blight".to_string()])
    );
    assert_eq!(body.top_plant, "Tomato");
}

#[tokio::test]
async fn test_stats_with_unreachable_store_is_zeroed() {
    let (state, store) = memory_state(answer("Tomato___Late_blight", 0.9));
    predict::predict_upload(&state, DiagnosisRequest::new(PNG, "t.png"))
        .await
        .unwrap();
    store.set_unavailable(true);

    let Json(body) = stats::stats(State(state)).await;
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"total_predictions": 0, "top_plant": "None"})
    );
}

#[tokio::test]
async fn test_predict_response_shape() {
    let (state, _store) = memory_state(answer("Apple___Apple_scab", 0.873));
    let response = predict::predict_upload(&state, DiagnosisRequest::new(PNG, "apple.jpg"))
        .await
        .unwrap();

    assert_eq!(response.status, PredictionStatus::Complete);
    assert_eq!(response.record_id, Some(1));
    assert!(response.warnings.is_empty());

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["plant_name"], "Apple");
    assert_eq!(value["predicted_disease"], "Apple scab");
    assert_eq!(value["category"], "Fungal");
    assert_eq!(value["confidence_score"], "87.30%");
    assert_eq!(
        value["biological_explanation"],
        "Caused by fungus Venturia inaequalis"
    );
    assert_eq!(value["severity"], "diseased");
    assert_eq!(value["status"], "complete");
}

#[tokio::test]
async fn test_predict_degraded_when_model_down() {
    let (state, store) = memory_state(Script::Fail(VisionError::AuthenticationFailed {
        message: "API key not configured for gemini".to_string(),
    }));

    let response = predict::predict_upload(&state, DiagnosisRequest::new(PNG, "leaf.png"))
        .await
        .unwrap();

    assert_eq!(response.status, PredictionStatus::Degraded);
    assert_eq!(response.warnings[0].code, "INFERENCE_UNAVAILABLE");
    assert!(response.warnings[0].detail.contains("API key"));
    assert_eq!(response.report.plant_name, "Plant");
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn test_predict_rejects_empty_upload() {
    let (state, _store) = memory_state(answer("Apple___healthy", 0.9));
    let err = predict::predict_upload(&state, DiagnosisRequest::new(Vec::new(), "empty.png"))
        .await
        .unwrap_err();

    let response = err.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_success() {
    let (state, store) = memory_state(answer("Apple___healthy", 0.9));
    let Json(body) = register::register(
        State(state),
        Ok(Json(RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555".to_string(),
        })),
    )
    .await
    .unwrap();

    assert_eq!(body.status, "success");
    assert_eq!(body.message, "User registered successfully");
    assert_eq!(store.registrations().await[0].email, "ada@example.com");
}

#[tokio::test]
async fn test_register_store_down_is_503() {
    let (state, store) = memory_state(answer("Apple___healthy", 0.9));
    store.set_unavailable(true);

    let err = register::register(
        State(state),
        Ok(Json(RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
        })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), "STORE_UNAVAILABLE");
    assert_eq!(
        err.into_response().status(),
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_health_reflects_store() {
    let (state, store) = memory_state(answer("Apple___healthy", 0.9));

    let Json(body) = health::health(State(state.clone())).await;
    assert_eq!(body.status, "ok");
    assert!(body.database);
    assert_eq!(body.service, "plant-diagnosis-backend");
    assert_eq!(body.provider, "scripted");
    assert_eq!(body.model, "scripted-vision");

    store.set_unavailable(true);
    let Json(body) = health::health(State(state)).await;
    assert_eq!(body.status, "degraded");
    assert!(!body.database);
}

#[tokio::test]
async fn test_liveness_and_root() {
    let Json(body) = health::liveness().await;
    assert_eq!(body.status, "alive");

    let Json(body) = health::root().await;
    assert!(body.message.contains("API is running"));
}
