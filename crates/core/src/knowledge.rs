//! Knowledge Base
//!
//! Human-authored guidance keyed by exact composite label. The table is
//! built once at startup and shared read-only; unknown labels are a normal
//! fallback path rather than an error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Category reported when a label has no knowledge entry.
pub const FALLBACK_CATEGORY: &str = "Consult AI Expert";

/// Curated table compiled into the binary.
const BUILTIN_TABLE: &str = include_str!("../data/knowledge.json");

/// Guidance for a single label. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precaution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_correction: Option<String>,
}

/// A knowledge entry with documented defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedKnowledge {
    pub category: String,
    pub scientific_reason: String,
    pub precaution: String,
    pub recommended_action: String,
    pub symptoms: String,
    pub nutrient_correction: String,
}

impl KnowledgeEntry {
    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill absent fields: the category falls back to
    /// [`FALLBACK_CATEGORY`], text fields to the empty string.
    pub fn resolve(self) -> ResolvedKnowledge {
        ResolvedKnowledge {
            category: self
                .category
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            scientific_reason: self.scientific_reason.unwrap_or_default(),
            precaution: self.precaution.unwrap_or_default(),
            recommended_action: self.recommended_action.unwrap_or_default(),
            symptoms: self.symptoms.unwrap_or_default(),
            nutrient_correction: self.nutrient_correction.unwrap_or_default(),
        }
    }
}

/// Immutable mapping from composite label to guidance.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: BTreeMap<String, KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build from an explicit set of entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, KnowledgeEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load the curated table shipped with the crate.
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json_str(BUILTIN_TABLE)
    }

    /// Parse a JSON object of `{ "<label>": { ...entry } }`.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let entries: BTreeMap<String, KnowledgeEntry> = serde_json::from_str(json)?;
        if entries.keys().any(|label| label.trim().is_empty()) {
            return Err(CoreError::validation("knowledge table contains an empty label"));
        }
        Ok(Self { entries })
    }

    /// Load a JSON knowledge table from disk.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Overlay `other` on top of this table; entries in `other` replace
    /// entries with the same label wholesale.
    pub fn merged_with(mut self, other: KnowledgeBase) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Exact-match lookup. Unknown labels yield an empty entry.
    pub fn lookup(&self, label: &str) -> KnowledgeEntry {
        self.entries.get(label).cloned().unwrap_or_default()
    }

    /// Whether an entry exists for this exact label.
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Known labels in sorted order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
