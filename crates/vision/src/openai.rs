//! OpenAI-Compatible Client
//!
//! Sends the leaf image as a base64 data URI through the Chat Completions
//! API. Works with any endpoint that accepts `image_url` content parts.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use plant_health_core::GuessPayload;

use crate::http_client::build_http_client;
use crate::prompt::{build_prompt, parse_guess_text};
use crate::provider::{missing_api_key_error, network_error, parse_http_error, DiagnosisClient};
use crate::types::{ClientConfig, LeafImage, VisionError, VisionResult};

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_MESSAGE: &str =
    "You are a plant disease diagnosis assistant. You always answer with a single JSON object.";

/// OpenAI-compatible vision client
pub struct OpenAICompatClient {
    config: ClientConfig,
    client: reqwest::Client,
    prompt: String,
}

impl OpenAICompatClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> VisionResult<Self> {
        let client = build_http_client(&config)?;
        let prompt = build_prompt(&config.label_hints);
        Ok(Self {
            config,
            client,
            prompt,
        })
    }

    /// Get the API endpoint URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Build the request body for the API
    fn build_request_body(&self, image: &LeafImage) -> serde_json::Value {
        let data_uri = format!(
            "data:{};base64,{}",
            image.mime_type,
            BASE64.encode(&image.bytes)
        );
        serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": self.prompt },
                        { "type": "image_url", "image_url": { "url": data_uri } }
                    ]
                }
            ]
        })
    }

    fn extract_text(response: &OpenAIResponse) -> VisionResult<String> {
        let choice = response.choices.first().ok_or_else(|| VisionError::ParseError {
            message: "No choices in response".to_string(),
        })?;

        if let Some(refusal) = choice.message.refusal.as_deref() {
            if !refusal.trim().is_empty() {
                return Err(VisionError::Blocked {
                    reason: refusal.to_string(),
                });
            }
        }

        match choice.message.content.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(VisionError::Blocked {
                reason: choice
                    .finish_reason
                    .clone()
                    .unwrap_or_else(|| "empty message".to_string()),
            }),
        }
    }
}

#[async_trait]
impl DiagnosisClient for OpenAICompatClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn diagnose(&self, image: &LeafImage) -> VisionResult<GuessPayload> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let body = self.build_request_body(image);
        tracing::debug!(
            "[OpenAI] Sending {} byte {} image to {}",
            image.len(),
            image.mime_type,
            self.config.model
        );

        let response = self
            .client
            .post(self.base_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(e, self.config.timeout_secs))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| network_error(e, self.config.timeout_secs))?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| VisionError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text = Self::extract_text(&openai_response)?;
        parse_guess_text(&text)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
