//! Label Normalizer
//!
//! Composite labels join a plant and a condition with `"___"`, e.g.
//! `Tomato___Late_blight`. Normalization splits them into display names and
//! never fails: labels without the delimiter fall back to generic names.

use serde::{Deserialize, Serialize};

/// Delimiter between the plant and condition halves of a composite label.
pub const LABEL_DELIMITER: &str = "___";

/// Label substituted when the model gives no class.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Plant name used when a label has no delimiter.
pub const DEFAULT_PLANT: &str = "Plant";

/// Condition name used when a label has no delimiter.
pub const DEFAULT_CONDITION: &str = "Condition";

/// Display names extracted from a composite label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLabel {
    pub plant_name: String,
    pub condition_name: String,
}

/// Coarse severity bucket derived from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Healthy,
    Diseased,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Healthy => "healthy",
            Severity::Diseased => "diseased",
            Severity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a label into plant and condition display names.
///
/// Only the first two delimiter-separated segments are used, so
/// `A___B___C` yields `("A", "B")`. Each underscore in a segment becomes a
/// single space; segments are not trimmed.
pub fn normalize(label: &str) -> NormalizedLabel {
    if !label.contains(LABEL_DELIMITER) {
        return NormalizedLabel {
            plant_name: DEFAULT_PLANT.to_string(),
            condition_name: DEFAULT_CONDITION.to_string(),
        };
    }

    let mut segments = label.split(LABEL_DELIMITER);
    let plant = segments.next().unwrap_or_default();
    let condition = segments.next().unwrap_or_default();

    NormalizedLabel {
        plant_name: plant.replace('_', " "),
        condition_name: condition.replace('_', " "),
    }
}

/// Classify a label as healthy, diseased, or unknown.
pub fn severity(label: &str) -> Severity {
    if !label.contains(LABEL_DELIMITER) {
        return Severity::Unknown;
    }
    let condition = label.split(LABEL_DELIMITER).nth(1).unwrap_or_default();
    if condition.to_lowercase().contains("healthy") {
        Severity::Healthy
    } else {
        Severity::Diseased
    }
}
