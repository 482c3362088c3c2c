//! Response Types
//!
//! Request and response bodies for the HTTP routes.

use serde::{Deserialize, Serialize};

use plant_health_core::DiagnosisReport;

use crate::services::record_store::PredictionStats;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "plant-diagnosis-backend";

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: bool,
    pub provider: String,
    pub model: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: false,
            provider: String::new(),
            model: String::new(),
        }
    }
}

/// Simple `{message}` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Liveness probe payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
    pub message: String,
}

/// Whether a prediction ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Complete,
    Degraded,
}

/// `/predict` response: the report fields at the top level plus outcome metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub report: DiagnosisReport,
    pub status: PredictionStatus,
    pub record_id: Option<i64>,
    pub warnings: Vec<ErrorBody>,
}

/// `/stats` response
///
/// The degraded form carries only `total_predictions` and `top_plant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_predictions: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_diseases: Option<Vec<String>>,
    pub top_plant: String,
}

impl StatsResponse {
    pub fn from_stats(stats: PredictionStats, model_accuracy: &str) -> Self {
        Self {
            total_predictions: stats.total_predictions,
            model_accuracy: Some(model_accuracy.to_string()),
            common_diseases: Some(stats.common_diseases),
            top_plant: stats.top_plant,
        }
    }

    /// Zeroed summary returned when the store cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            total_predictions: 0,
            model_accuracy: None,
            common_diseases: None,
            top_plant: "None".to_string(),
        }
    }
}

/// `/register` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// `/register` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    pub message: String,
}

impl RegisterResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "User registered successfully".to_string(),
        }
    }
}
