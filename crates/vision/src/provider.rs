//! Diagnosis Client Trait
//!
//! Defines the common interface for all remote vision models.

use std::sync::Arc;

use async_trait::async_trait;
use plant_health_core::GuessPayload;

use crate::gemini::GeminiClient;
use crate::openai::OpenAICompatClient;
use crate::types::{ClientConfig, LeafImage, ProviderKind, VisionError, VisionResult};

/// Trait that all diagnosis clients must implement.
///
/// Implementations return the model's answer as a [`GuessPayload`] with
/// whatever fields the model produced; defaults are applied by the caller.
#[async_trait]
pub trait DiagnosisClient: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Ask the model to diagnose a leaf image.
    async fn diagnose(&self, image: &LeafImage) -> VisionResult<GuessPayload>;
}

/// Build the client for the configured provider.
pub fn create_client(config: ClientConfig) -> VisionResult<Arc<dyn DiagnosisClient>> {
    let client: Arc<dyn DiagnosisClient> = match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiClient::new(config)?),
        ProviderKind::OpenAI => Arc::new(OpenAICompatClient::new(config)?),
    };
    Ok(client)
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> VisionError {
    VisionError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to map HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> VisionError {
    match status {
        401 => VisionError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => VisionError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => VisionError::ModelNotFound {
            model: body.to_string(),
        },
        429 => VisionError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => VisionError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => VisionError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => VisionError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Map a transport failure from reqwest.
pub(crate) fn network_error(err: reqwest::Error, timeout_secs: u64) -> VisionError {
    if err.is_timeout() {
        VisionError::Timeout {
            after: std::time::Duration::from_secs(timeout_secs),
        }
    } else {
        VisionError::NetworkError {
            message: err.to_string(),
        }
    }
}
