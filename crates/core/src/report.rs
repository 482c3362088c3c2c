//! Diagnosis Assembler
//!
//! Merges a model guess, its normalized label, and the matching knowledge
//! entry into the persisted record and the presentation report.
//!
//! Text supplied by the model always wins over static knowledge text; the
//! knowledge base only fills gaps.

use serde::{Deserialize, Serialize};

use crate::guess::RawGuess;
use crate::knowledge::ResolvedKnowledge;
use crate::label::{severity, NormalizedLabel, Severity};

/// Rendering used when a confidence cannot be formatted.
const FALLBACK_CONFIDENCE_TEXT: &str = "95.00%";

/// Row persisted for each successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub filename: String,
    pub plant_name: String,
    pub predicted_disease: String,
    pub category: String,
    pub confidence_score: f64,
}

/// Presentation fields returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub plant_name: String,
    pub predicted_disease: String,
    pub category: String,
    pub confidence_score: String,
    pub biological_explanation: String,
    pub precaution: String,
    pub recommended_action: String,
    pub symptoms: String,
    pub nutrient_correction: String,
    pub severity: Severity,
}

/// Output of [`assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub record: DiagnosisRecord,
    pub report: DiagnosisReport,
}

/// Render a `[0, 1]` confidence as a two-decimal percentage.
///
/// Non-finite input renders as `"95.00%"`.
pub fn format_confidence(confidence: f64) -> String {
    if !confidence.is_finite() {
        return FALLBACK_CONFIDENCE_TEXT.to_string();
    }
    format!("{:.2}%", confidence * 100.0)
}

fn first_non_empty(preferred: &str, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}

/// Combine guess, label, and knowledge into a record and a report.
pub fn assemble(
    filename: &str,
    guess: &RawGuess,
    label: &NormalizedLabel,
    knowledge: &ResolvedKnowledge,
) -> Diagnosis {
    let record = DiagnosisRecord {
        filename: filename.to_string(),
        plant_name: label.plant_name.clone(),
        predicted_disease: label.condition_name.clone(),
        category: knowledge.category.clone(),
        confidence_score: guess.confidence,
    };

    let report = DiagnosisReport {
        plant_name: label.plant_name.clone(),
        predicted_disease: label.condition_name.clone(),
        category: knowledge.category.clone(),
        confidence_score: format_confidence(guess.confidence),
        biological_explanation: first_non_empty(&guess.analysis, &knowledge.scientific_reason),
        precaution: knowledge.precaution.clone(),
        recommended_action: first_non_empty(&guess.recommendation, &knowledge.recommended_action),
        symptoms: knowledge.symptoms.clone(),
        nutrient_correction: knowledge.nutrient_correction.clone(),
        severity: severity(&guess.label),
    };

    Diagnosis { record, report }
}
