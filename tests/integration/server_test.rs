//! HTTP Server Integration Tests
//!
//! Binds the router on an ephemeral port and talks to it over real HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use plant_health_server::{router, AppConfig, AppState, InMemoryRecordStore};

use crate::support::{answer, memory_state, service_with, ScriptedClient, PNG};

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = state.shutdown_token().clone();
    tokio::spawn(async move {
        axum::serve(listener, router(state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .unwrap();
    });
    addr
}

fn upload(bytes: Vec<u8>, filename: &str) -> Form {
    Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()))
}

#[tokio::test]
async fn test_predict_over_http_then_stats() {
    let (state, _store) = memory_state(answer("Apple___Apple_scab", 0.873));
    let shutdown = state.shutdown_token().clone();
    let addr = spawn_server(state).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/api/predict", addr))
        .multipart(upload(PNG.to_vec(), "apple.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plant_name"], "Apple");
    assert_eq!(body["category"], "Fungal");
    assert_eq!(body["confidence_score"], "87.30%");
    assert_eq!(body["status"], "complete");

    // Unprefixed alias reaches the same handler.
    let response = http
        .post(format!("http://{}/predict", addr))
        .multipart(upload(PNG.to_vec(), "apple2.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let stats: Value = http
        .get(format!("http://{}/api/stats", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_predictions"], 2);
    assert_eq!(stats["top_plant"], "Apple");
    assert_eq!(stats["common_diseases"][0], "Apple Apple scab");

    shutdown.cancel();
}

#[tokio::test]
async fn test_missing_file_field_is_400() {
    let (state, _store) = memory_state(answer("Apple___healthy", 0.9));
    let shutdown = state.shutdown_token().clone();
    let addr = spawn_server(state).await;

    let form = Form::new().text("note", "no image here");
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/predict", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["detail"].as_str().unwrap().contains("file"));

    shutdown.cancel();
}

#[tokio::test]
async fn test_oversize_upload_is_413() {
    let config = AppConfig {
        max_upload_bytes: 256,
        ..Default::default()
    };
    let service = service_with(
        ScriptedClient::new(answer("Apple___healthy", 0.9)),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(5),
    );
    let shutdown = CancellationToken::new();
    let addr = spawn_server(AppState::new(config, service, shutdown.clone())).await;

    let mut big = PNG.to_vec();
    big.resize(4096, 0);
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/predict", addr))
        .multipart(upload(big, "big.png"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    shutdown.cancel();
}

#[tokio::test]
async fn test_health_liveness_and_register() {
    let (state, store) = memory_state(answer("Apple___healthy", 0.9));
    let shutdown = state.shutdown_token().clone();
    let addr = spawn_server(state).await;
    let http = reqwest::Client::new();

    let health: Value = http
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "plant-diagnosis-backend");

    let alive: Value = http
        .get(format!("http://{}/test", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alive["status"], "alive");

    let response = http
        .post(format!("http://{}/api/register", addr))
        .json(&serde_json::json!({"name": "Lin", "email": "lin@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(store.registrations().await[0].phone, "");

    let response = http
        .post(format!("http://{}/api/register", addr))
        .json(&serde_json::json!({"name": "Lin", "email": "not-an-email"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    shutdown.cancel();
}

#[tokio::test]
async fn test_extractor_rejections_use_error_body() {
    let (state, _store) = memory_state(answer("Apple___healthy", 0.9));
    let shutdown = state.shutdown_token().clone();
    let addr = spawn_server(state).await;
    let http = reqwest::Client::new();

    // Register body missing a required field.
    let response = http
        .post(format!("http://{}/api/register", addr))
        .json(&serde_json::json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["detail"].as_str().unwrap().contains("email"));

    // Predict with a JSON body instead of a multipart form.
    let response = http
        .post(format!("http://{}/api/predict", addr))
        .json(&serde_json::json!({"file": "leaf.png"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(!body["detail"].as_str().unwrap().is_empty());

    shutdown.cancel();
}
