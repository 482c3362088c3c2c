//! Prediction Pipeline
//!
//! Takes an uploaded image to an enriched, persisted diagnosis:
//! validate, ask the vision model under a deadline, normalize the label,
//! look up knowledge, assemble, persist.
//!
//! Collaborator failures do not abort the request. A failed or timed-out
//! model call yields an `"Unknown"` diagnosis that is returned but not
//! persisted; a failed write returns the diagnosis without a record id.
//! Both are reported as warnings on the outcome.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use plant_health_core::{assemble, normalize, DiagnosisReport, KnowledgeBase, RawGuess};
use plant_health_vision::{DiagnosisClient, LeafImage, VisionError};

use crate::models::response::{PredictResponse, PredictionStatus};
use crate::services::record_store::RecordStore;
use crate::services::uploads::UploadScratch;
use crate::utils::error::{AppError, AppResult};

/// Filename recorded when the client sends none
pub const DEFAULT_UPLOAD_NAME: &str = "upload";

/// One uploaded image.
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub bytes: Bytes,
    pub filename: String,
}

impl DiagnosisRequest {
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }
}

/// Result of a prediction, possibly degraded.
#[derive(Debug)]
pub struct DiagnosisOutcome {
    pub report: DiagnosisReport,
    /// Identifier of the persisted record, if one was written
    pub record_id: Option<i64>,
    /// Collaborator failures that were absorbed
    pub warnings: Vec<AppError>,
}

impl DiagnosisOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn status(&self) -> PredictionStatus {
        if self.is_degraded() {
            PredictionStatus::Degraded
        } else {
            PredictionStatus::Complete
        }
    }

    pub fn into_response(self) -> PredictResponse {
        PredictResponse {
            status: self.status(),
            warnings: self.warnings.iter().map(AppError::body).collect(),
            record_id: self.record_id,
            report: self.report,
        }
    }
}

/// The prediction pipeline with its injected collaborators.
pub struct DiagnosisService {
    client: Arc<dyn DiagnosisClient>,
    knowledge: Arc<KnowledgeBase>,
    store: Arc<dyn RecordStore>,
    uploads: Option<UploadScratch>,
    timeout: Duration,
}

impl DiagnosisService {
    pub fn new(
        client: Arc<dyn DiagnosisClient>,
        knowledge: Arc<KnowledgeBase>,
        store: Arc<dyn RecordStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            knowledge,
            store,
            uploads: None,
            timeout,
        }
    }

    /// Keep a copy of every upload in `uploads`.
    pub fn with_uploads(mut self, uploads: UploadScratch) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn client(&self) -> &Arc<dyn DiagnosisClient> {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the full pipeline for one upload.
    ///
    /// Only validation failures are returned as errors.
    pub async fn diagnose(
        &self,
        request: DiagnosisRequest,
        cancel: CancellationToken,
    ) -> AppResult<DiagnosisOutcome> {
        let image = validate(&request)?;
        let filename = if request.filename.trim().is_empty() {
            DEFAULT_UPLOAD_NAME.to_string()
        } else {
            request.filename.clone()
        };

        self.keep_upload(&filename, &request.bytes).await;

        let mut warnings = Vec::new();
        let (guess, inferred) = match self.infer(&image, &cancel).await {
            Ok(guess) => (guess, true),
            Err(err) => {
                tracing::warn!("[Pipeline] Inference failed for {}: {}", filename, err);
                warnings.push(err);
                (RawGuess::unavailable(), false)
            }
        };

        let label = normalize(&guess.label);
        let knowledge = self.knowledge.lookup(&guess.label).resolve();
        let diagnosis = assemble(&filename, &guess, &label, &knowledge);

        let record_id = if inferred {
            match self.store.save(&diagnosis.record).await {
                Ok(id) => Some(id),
                Err(err) => {
                    tracing::warn!("[Pipeline] Could not persist diagnosis: {}", err);
                    warnings.push(err);
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            "[Pipeline] {} -> {} ({}, {})",
            filename,
            guess.label,
            diagnosis.report.confidence_score,
            if warnings.is_empty() { "complete" } else { "degraded" }
        );

        Ok(DiagnosisOutcome {
            report: diagnosis.report,
            record_id,
            warnings,
        })
    }

    /// Ask the model under the deadline, racing the cancellation token.
    async fn infer(&self, image: &LeafImage, cancel: &CancellationToken) -> AppResult<RawGuess> {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(VisionError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.client.diagnose(image)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(VisionError::Timeout {
                        after: self.timeout,
                    }),
                }
            }
        };

        let payload = result?;
        Ok(payload.into_guess())
    }

    async fn keep_upload(&self, filename: &str, bytes: &[u8]) {
        if let Some(uploads) = &self.uploads {
            if let Err(e) = uploads.save(filename, bytes).await {
                tracing::warn!("[Pipeline] Could not keep upload {}: {}", filename, e);
            }
        }
    }
}

/// Reject empty uploads and bytes that are not a supported image.
fn validate(request: &DiagnosisRequest) -> AppResult<LeafImage> {
    if request.bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }
    let image = LeafImage::from_bytes(request.bytes.clone());
    if !image.is_recognised_image() {
        return Err(AppError::validation(
            "Uploaded file is not a supported image (png, jpeg, gif, webp, bmp, tiff, heic)",
        ));
    }
    Ok(image)
}
