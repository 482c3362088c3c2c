//! Prediction Pipeline Integration Tests
//!
//! Drives `DiagnosisService` with a scripted client against both stores:
//! - Known label enriched from the built-in knowledge table
//! - Unknown label persisted with the fallback category
//! - Model text winning over knowledge text
//! - Degraded outcomes for failures, timeouts, cancellation, and store loss

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use plant_health_core::{GuessPayload, Severity, FALLBACK_CATEGORY};
use plant_health_server::{
    Database, DiagnosisRequest, InMemoryRecordStore, PredictionStatus, RecordStore,
    SqliteRecordStore,
};
use plant_health_vision::VisionError;

use crate::support::{answer, service_with, Script, ScriptedClient, PNG};

fn request(filename: &str) -> DiagnosisRequest {
    DiagnosisRequest::new(PNG, filename)
}

// ============================================================================
// Successful predictions
// ============================================================================

#[tokio::test]
async fn test_apple_scab_end_to_end() {
    let store = InMemoryRecordStore::new();
    let client = ScriptedClient::new(answer("Apple___Apple_scab", 0.873));
    let service = service_with(client.clone(), Arc::new(store.clone()), Duration::from_secs(5));

    let outcome = service
        .diagnose(request("apple.jpg"), CancellationToken::new())
        .await
        .unwrap();

    let report = &outcome.report;
    assert_eq!(report.plant_name, "Apple");
    assert_eq!(report.predicted_disease, "Apple scab");
    assert_eq!(report.category, "Fungal");
    assert_eq!(report.confidence_score, "87.30%");
    assert_eq!(
        report.biological_explanation,
        "Caused by fungus Venturia inaequalis"
    );
    assert!(!report.recommended_action.is_empty());
    assert_eq!(report.severity, Severity::Diseased);
    assert_eq!(outcome.status(), PredictionStatus::Complete);
    assert_eq!(client.calls(), 1);

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "apple.jpg");
    assert_eq!(records[0].category, "Fungal");
    assert!((records[0].confidence_score - 0.873).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_unknown_label_persisted_with_fallback() {
    let store = InMemoryRecordStore::new();
    let service = service_with(
        ScriptedClient::new(answer("Dragonfruit___Stem_canker", 0.61)),
        Arc::new(store.clone()),
        Duration::from_secs(5),
    );

    let outcome = service
        .diagnose(request("dragon.png"), CancellationToken::new())
        .await
        .unwrap();

    let report = &outcome.report;
    assert_eq!(report.plant_name, "Dragonfruit");
    assert_eq!(report.predicted_disease, "Stem canker");
    assert_eq!(report.category, FALLBACK_CATEGORY);
    assert_eq!(report.biological_explanation, "");
    assert_eq!(report.precaution, "");
    assert_eq!(report.recommended_action, "");
    assert_eq!(report.symptoms, "");
    assert_eq!(report.nutrient_correction, "");
    assert!(outcome.record_id.is_some());
    assert_eq!(store.records().await[0].category, FALLBACK_CATEGORY);
}

#[tokio::test]
async fn test_model_text_wins_over_knowledge() {
    let script = Script::Answer(GuessPayload {
        predicted_class: Some("Tomato___Late_blight".to_string()),
        confidence: Some(serde_json::json!("88%")),
        analysis: Some("Water-soaked lesions typical of Phytophthora.".to_string()),
        recommendation: Some("Remove infected plants today.".to_string()),
    });
    let service = service_with(
        ScriptedClient::new(script),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(5),
    );

    let outcome = service
        .diagnose(request("tomato.png"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.report.biological_explanation,
        "Water-soaked lesions typical of Phytophthora."
    );
    assert_eq!(outcome.report.recommended_action, "Remove infected plants today.");
    assert_eq!(outcome.report.confidence_score, "88.00%");
    assert!(!outcome.report.precaution.is_empty());
}

#[tokio::test]
async fn test_missing_fields_get_defaults() {
    let service = service_with(
        ScriptedClient::new(Script::Answer(GuessPayload::default())),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(5),
    );

    let outcome = service
        .diagnose(request("blank.png"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.plant_name, "Plant");
    assert_eq!(outcome.report.predicted_disease, "Condition");
    assert_eq!(outcome.report.confidence_score, "95.00%");
    assert_eq!(outcome.report.severity, Severity::Unknown);
    assert!(!outcome.is_degraded());
}

#[tokio::test]
async fn test_sqlite_store_records_prediction() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::connect(&tmp.path().join("plant_health.db")).unwrap();
    let store = Arc::new(SqliteRecordStore::new(db));
    let service = service_with(
        ScriptedClient::new(answer("Potato___Early_blight", 0.77)),
        store.clone(),
        Duration::from_secs(5),
    );

    for _ in 0..2 {
        service
            .diagnose(request("potato.png"), CancellationToken::new())
            .await
            .unwrap();
    }

    assert_eq!(store.count().await.unwrap(), 2);
    let stats = store.recent_stats().await.unwrap();
    assert_eq!(stats.top_plant, "Potato");
    assert_eq!(stats.common_diseases, vec!["Potato Early blight".to_string()]);
}

// ============================================================================
// Degraded outcomes
// ============================================================================

#[tokio::test]
async fn test_inference_failure_returns_unknown_and_skips_store() {
    let store = InMemoryRecordStore::new();
    let service = service_with(
        ScriptedClient::new(Script::Fail(VisionError::ServerError {
            message: "overloaded".to_string(),
            status: Some(503),
        })),
        Arc::new(store.clone()),
        Duration::from_secs(5),
    );

    let outcome = service
        .diagnose(request("leaf.png"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status(), PredictionStatus::Degraded);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].code(), "INFERENCE_UNAVAILABLE");
    assert_eq!(outcome.report.category, FALLBACK_CATEGORY);
    assert_eq!(outcome.record_id, None);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_hung_client_times_out() {
    let store = InMemoryRecordStore::new();
    let client = ScriptedClient::new(Script::Hang);
    let service = service_with(client.clone(), Arc::new(store.clone()), Duration::from_millis(100));

    let outcome = service
        .diagnose(request("leaf.png"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(outcome.warnings[0].code(), "INFERENCE_UNAVAILABLE");
    assert!(outcome.warnings[0].to_string().contains("timed out"));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let service = service_with(
        ScriptedClient::new(Script::Hang),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(3600),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        service.diagnose(request("leaf.png"), cancel),
    )
    .await
    .expect("cancellation ends the request")
    .unwrap();

    assert!(outcome.warnings[0].to_string().contains("cancelled"));
}

#[tokio::test]
async fn test_store_failure_keeps_report() {
    let store = InMemoryRecordStore::new();
    store.set_unavailable(true);
    let service = service_with(
        ScriptedClient::new(answer("Apple___Apple_scab", 0.873)),
        Arc::new(store.clone()),
        Duration::from_secs(5),
    );

    let outcome = service
        .diagnose(request("apple.jpg"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.category, "Fungal");
    assert_eq!(outcome.record_id, None);
    assert_eq!(outcome.warnings[0].code(), "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_validation_errors_skip_the_model() {
    let client = ScriptedClient::new(answer("Apple___healthy", 0.9));
    let service = service_with(
        client.clone(),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(5),
    );

    let err = service
        .diagnose(
            DiagnosisRequest::new(&b"%PDF-1.7 not an image"[..], "doc.pdf"),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(client.calls(), 0);
}
