//! Vision Client Types
//!
//! Configuration, image input, and error types shared by all diagnosis clients.

use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mime type assumed when the bytes match no known image signature.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Errors raised while asking a remote model for a diagnosis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Server error{}: {message}", status_suffix(.status))]
    ServerError { message: String, status: Option<u16> },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// The model returned no usable candidate, e.g. a safety block.
    #[error("Response blocked: {reason}")]
    Blocked { reason: String },

    #[error("Diagnosis request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Diagnosis request cancelled")]
    Cancelled,

    #[error("{message}")]
    Other { message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Result type alias for vision client operations
pub type VisionResult<T> = Result<T, VisionError>;

/// Which remote API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAI => "gpt-4o-mini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAI),
            other => Err(VisionError::InvalidRequest {
                message: format!("Unknown vision provider: {}", other),
            }),
        }
    }
}

/// Settings for a diagnosis client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    /// HTTP-level timeout; the pipeline applies its own deadline as well.
    pub timeout_secs: u64,
    /// e.g. `http://127.0.0.1:8080` or `socks5://proxy:1080`
    pub proxy_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Known composite labels offered to the model as answer candidates.
    pub label_hints: Vec<String>,
}

impl ClientConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            proxy_url: None,
            temperature: 0.1,
            max_output_tokens: 1024,
            label_hints: Vec::new(),
        }
    }
}

/// An uploaded leaf image ready to send to a model.
#[derive(Debug, Clone)]
pub struct LeafImage {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl LeafImage {
    /// Wrap raw bytes, sniffing the mime type from the file signature.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let mime_type = sniff_mime_type(&bytes)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        Self { bytes, mime_type }
    }

    /// Whether the bytes carry a recognised image signature.
    pub fn is_recognised_image(&self) -> bool {
        sniff_mime_type(&self.bytes).is_some()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Detect the image format from magic bytes.
///
/// Covers png, jpeg, gif, webp, bmp, tiff, and the HEIC/HEIF container
/// phone cameras write.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if let Some(mime) = sniff_heif(bytes) {
        return Some(mime);
    }
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Gif => Some("image/gif"),
        image::ImageFormat::WebP => Some("image/webp"),
        image::ImageFormat::Bmp => Some("image/bmp"),
        image::ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

/// ISO-BMFF `ftyp` box with a HEIC or HEIF major brand.
fn sniff_heif(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    match &bytes[8..12] {
        b"heic" | b"heix" | b"hevc" | b"hevx" => Some("image/heic"),
        b"mif1" | b"msf1" | b"heif" => Some("image/heif"),
        _ => None,
    }
}
