//! Plant Health Vision
//!
//! Clients that send a leaf photo to a hosted vision-language model and
//! return its raw guess:
//! - Google Gemini (`generateContent` with inline image data)
//! - OpenAI and compatible Chat Completions endpoints (`image_url` data URIs)
//!
//! Also includes the shared diagnosis prompt and the HTTP client factory.

pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiClient;
pub use http_client::build_http_client;
pub use openai::OpenAICompatClient;
pub use prompt::{build_prompt, parse_guess_text};
pub use provider::{create_client, DiagnosisClient};
pub use types::*;
