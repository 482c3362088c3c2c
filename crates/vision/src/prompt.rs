//! Diagnosis Prompt
//!
//! The instruction sent alongside every image, and parsing of the model's
//! free-text answer back into a [`GuessPayload`].

use plant_health_core::{GuessPayload, LABEL_DELIMITER};

use crate::types::{VisionError, VisionResult};

const BASE_PROMPT: &str = "You are an expert plant pathologist. Examine the attached photo of a \
plant leaf and diagnose its health.

Respond with ONLY a JSON object, no markdown fences and no extra text, with these fields:
- \"predicted_class\": the diagnosis as \"Plant___Condition\" using three underscores and \
underscores instead of spaces (for example \"Tomato___Late_blight\" or \"Apple___healthy\")
- \"confidence\": a number between 0 and 1
- \"analysis\": two or three sentences on the biological cause of what you see
- \"recommendation\": one or two sentences of practical treatment advice";

/// Build the prompt, listing known labels when available so answers can be
/// matched against the knowledge base.
pub fn build_prompt(label_hints: &[String]) -> String {
    if label_hints.is_empty() {
        return BASE_PROMPT.to_string();
    }
    format!(
        "{}\n\nWhen the image matches one of these known classes, answer with that exact \
         class string:\n{}",
        BASE_PROMPT,
        label_hints.join("\n")
    )
}

/// Parse a model's text answer into a guess payload.
///
/// Accepts a bare JSON object, one wrapped in markdown fences, or one
/// surrounded by prose. A bare composite label (e.g. `Tomato___healthy`)
/// is accepted as a label-only answer.
pub fn parse_guess_text(text: &str) -> VisionResult<GuessPayload> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VisionError::ParseError {
            message: "Empty response from model".to_string(),
        });
    }

    let unfenced = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    if let (Some(start), Some(end)) = (unfenced.find('{'), unfenced.rfind('}')) {
        if end > start {
            return serde_json::from_str(&unfenced[start..=end]).map_err(|e| {
                VisionError::ParseError {
                    message: format!("Invalid diagnosis JSON: {}", e),
                }
            });
        }
    }

    if is_bare_label(unfenced) {
        return Ok(GuessPayload {
            predicted_class: Some(unfenced.to_string()),
            ..Default::default()
        });
    }

    Err(VisionError::ParseError {
        message: format!(
            "No JSON object found in model response: {}",
            truncate(unfenced, 200)
        ),
    })
}

fn is_bare_label(text: &str) -> bool {
    text.contains(LABEL_DELIMITER) && !text.chars().any(char::is_whitespace)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + "…"
}
