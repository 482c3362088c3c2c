//! Gemini Client
//!
//! Diagnoses leaf images through Google's `generateContent` endpoint, sending
//! the image as an inline base64 part next to the diagnosis prompt.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use plant_health_core::GuessPayload;

use crate::http_client::build_http_client;
use crate::prompt::{build_prompt, parse_guess_text};
use crate::provider::{missing_api_key_error, network_error, parse_http_error, DiagnosisClient};
use crate::types::{ClientConfig, LeafImage, VisionError, VisionResult};

/// Default Gemini API base
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini vision client
pub struct GeminiClient {
    config: ClientConfig,
    client: reqwest::Client,
    prompt: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration
    pub fn new(config: ClientConfig) -> VisionResult<Self> {
        let client = build_http_client(&config)?;
        let prompt = build_prompt(&config.label_hints);
        Ok(Self {
            config,
            client,
            prompt,
        })
    }

    /// Full `generateContent` URL for the configured model.
    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/');
        let model = self.config.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", base, model_path)
    }

    /// Build the request body for the API
    fn build_request_body(&self, image: &LeafImage) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime_type,
                            "data": BASE64.encode(&image.bytes),
                        }
                    },
                    { "text": self.prompt }
                ]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens,
                "responseMimeType": "application/json",
            }
        })
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: &GeminiResponse) -> VisionResult<String> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(VisionError::Blocked {
                reason: reason.clone(),
            });
        }

        let candidate = response.candidates.first().ok_or_else(|| VisionError::Blocked {
            reason: "no candidates returned".to_string(),
        })?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(VisionError::Blocked {
                reason: candidate
                    .finish_reason
                    .clone()
                    .unwrap_or_else(|| "empty candidate".to_string()),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl DiagnosisClient for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn diagnose(&self, image: &LeafImage) -> VisionResult<GuessPayload> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("gemini"))?;

        let body = self.build_request_body(image);
        tracing::debug!(
            "[Gemini] Sending {} byte {} image to {}",
            image.len(),
            image.mime_type,
            self.config.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
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
            return Err(parse_http_error(status, &body_text, "gemini"));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&body_text).map_err(|e| VisionError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text = Self::extract_text(&gemini_response)?;
        parse_guess_text(&text)
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
