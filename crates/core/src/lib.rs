//! Plant Health Core
//!
//! Domain types and pure transformations for the leaf diagnosis pipeline.
//! This crate performs no network or database I/O; the only file access is
//! loading an optional knowledge table from disk.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `label` - Composite label normalization and severity classification
//! - `guess` - Raw model guesses and the single defaults-filling step
//! - `knowledge` - Static disease knowledge base keyed by composite label
//! - `report` - Confidence formatting and the diagnosis assembler
//!
//! ## Design Principles
//!
//! 1. **Optional at the edge, total inside** - wire shapes carry `Option`s,
//!    a single normalization step fills defaults, everything after is total
//! 2. **Exact-match joins** - labels join the knowledge base without fuzzing
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod guess;
pub mod knowledge;
pub mod label;
pub mod report;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Guesses ────────────────────────────────────────────────────────────
pub use guess::{GuessPayload, RawGuess, DEFAULT_CONFIDENCE};

// ── Knowledge Base ─────────────────────────────────────────────────────
pub use knowledge::{KnowledgeBase, KnowledgeEntry, ResolvedKnowledge, FALLBACK_CATEGORY};

// ── Labels ─────────────────────────────────────────────────────────────
pub use label::{normalize, severity, NormalizedLabel, Severity, LABEL_DELIMITER, UNKNOWN_LABEL};

// ── Assembler ──────────────────────────────────────────────────────────
pub use report::{assemble, format_confidence, Diagnosis, DiagnosisRecord, DiagnosisReport};
