//! Plant Health Server
//!
//! HTTP backend that diagnoses plant-leaf photos. It includes:
//! - The prediction pipeline (vision model, label normalization, knowledge lookup)
//! - HTTP routes served with axum
//! - Storage layer (SQLite, JSON config)
//! - Data models and utilities

pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// ── Routes ───────────────────────────────────────────────────────────────
pub use routes::router;

// ── Services ─────────────────────────────────────────────────────────────
pub use services::pipeline::{DiagnosisOutcome, DiagnosisRequest, DiagnosisService};
pub use services::record_store::{
    InMemoryRecordStore, PredictionStats, RecordStore, Registration, SqliteRecordStore,
};
pub use services::uploads::UploadScratch;

// ── Models ───────────────────────────────────────────────────────────────
pub use models::response::*;
pub use models::settings::{AppConfig, VisionSettings};
pub use state::AppState;
pub use storage::{ConfigService, Database};

// ── Error Types ──────────────────────────────────────────────────────────
pub use utils::error::{AppError, AppResult};
