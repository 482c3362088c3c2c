//! Model Guesses
//!
//! `GuessPayload` is the loosely-typed shape a vision model answers with.
//! `GuessPayload::into_guess` is the one place where missing fields are
//! replaced by defaults; downstream code only ever sees a `RawGuess`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::label::UNKNOWN_LABEL;

/// Confidence used when the model omits one or sends something unreadable.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Wire-shaped guess with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuessPayload {
    #[serde(default, alias = "label", alias = "class")]
    pub predicted_class: Option<String>,
    /// Number, numeric string, or percentage string.
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// A model guess with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGuess {
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub analysis: String,
    pub recommendation: String,
}

impl RawGuess {
    /// The guess used when the model could not be consulted.
    pub fn unavailable() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            analysis: String::new(),
            recommendation: String::new(),
        }
    }
}

impl GuessPayload {
    /// Fill defaults and coerce confidence into `[0, 1]`.
    pub fn into_guess(self) -> RawGuess {
        let label = self
            .predicted_class
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let confidence = self
            .confidence
            .as_ref()
            .and_then(confidence_from_value)
            .unwrap_or(DEFAULT_CONFIDENCE);

        RawGuess {
            label,
            confidence,
            analysis: self.analysis.unwrap_or_default(),
            recommendation: self.recommendation.unwrap_or_default(),
        }
    }
}

/// Bare numbers above this are read as percentages; between 1 and this
/// they are clamped to 1.
const PERCENT_THRESHOLD: f64 = 1.5;

/// Read a confidence from a JSON value.
///
/// Strings ending in `%` and numbers above [`PERCENT_THRESHOLD`] are treated
/// as percentages. Returns `None` for anything non-numeric or non-finite.
fn confidence_from_value(value: &Value) -> Option<f64> {
    let (raw, is_percent) = match value {
        Value::Number(n) => (n.as_f64()?, false),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(number) => (number.trim().parse::<f64>().ok()?, true),
                None => (s.parse::<f64>().ok()?, false),
            }
        }
        _ => return None,
    };

    if !raw.is_finite() {
        return None;
    }

    let fraction = if is_percent || raw > PERCENT_THRESHOLD {
        raw / 100.0
    } else {
        raw
    };
    Some(fraction.clamp(0.0, 1.0))
}
