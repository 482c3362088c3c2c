//! Upload Scratch Directory
//!
//! Uploaded images are copied here for later inspection. Nothing in the
//! server reads them back.

use std::path::{Path, PathBuf};

use crate::utils::error::AppResult;
use crate::utils::paths::ensure_dir;

const MAX_FILENAME_CHARS: usize = 100;
const FALLBACK_FILENAME: &str = "upload";

/// Writable directory for uploaded files.
#[derive(Debug, Clone)]
pub struct UploadScratch {
    dir: PathBuf,
}

impl UploadScratch {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if missing.
    pub fn prepare(&self) -> AppResult<()> {
        ensure_dir(&self.dir)
    }

    /// Write `bytes` under a unique name derived from `filename`.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!(
            "{}_{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_filename(filename)
        ));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Reduce a client-supplied name to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
