//! Application State
//!
//! Shared state handed to every route, containing all services.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use plant_health_core::KnowledgeBase;
use plant_health_vision::create_client;

use crate::models::settings::AppConfig;
use crate::services::pipeline::DiagnosisService;
use crate::services::record_store::{RecordStore, SqliteRecordStore};
use crate::services::uploads::UploadScratch;
use crate::storage::database::Database;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::parse_database_url;

/// Application state shared by all routes
#[derive(Clone)]
pub struct AppState {
    /// Effective configuration
    config: Arc<AppConfig>,
    /// Prediction pipeline with its collaborators
    service: Arc<DiagnosisService>,
    /// Cancelled on shutdown; requests derive child tokens from it
    shutdown: CancellationToken,
}

impl AppState {
    /// Assemble state from already constructed services
    pub fn new(config: AppConfig, service: DiagnosisService, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            shutdown,
        }
    }

    /// Build every service from configuration
    pub async fn initialize(config: AppConfig, shutdown: CancellationToken) -> AppResult<Self> {
        let knowledge = Arc::new(load_knowledge(&config)?);
        tracing::info!("[State] Knowledge base loaded with {} labels", knowledge.len());

        let client_config = config.vision.to_client_config(knowledge.labels());
        if client_config.api_key.is_none() {
            tracing::warn!(
                "[State] No API key configured for {}; predictions will be degraded",
                client_config.provider
            );
        }
        let client = create_client(client_config)
            .map_err(|e| AppError::config(format!("Failed to create vision client: {}", e)))?;
        tracing::info!("[State] Vision client: {} ({})", client.name(), client.model());

        let location = parse_database_url(&config.database_url)?;
        let store = SqliteRecordStore::new(Database::open(&location)?);
        // Startup continues without a schema; stats and writes retry it.
        if let Err(e) = store.ensure_schema().await {
            tracing::warn!("[State] Database initialization failed, continuing: {}", e);
        }

        let uploads = UploadScratch::new(config.uploads_dir.clone());
        if let Err(e) = uploads.prepare() {
            tracing::warn!(
                "[State] Could not create uploads dir {}: {}",
                uploads.dir().display(),
                e
            );
        }

        let service = DiagnosisService::new(
            client,
            knowledge,
            Arc::new(store),
            Duration::from_secs(config.vision.timeout_secs),
        )
        .with_uploads(uploads);

        Ok(Self::new(config, service, shutdown))
    }

    /// Get the current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the prediction pipeline
    pub fn service(&self) -> &DiagnosisService {
        &self.service
    }

    /// Get the record store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        self.service.store()
    }

    /// Token cancelled when the server shuts down
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Per-request token, cancelled with the server
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Built-in table, overlaid with `knowledge_path` when configured
fn load_knowledge(config: &AppConfig) -> AppResult<KnowledgeBase> {
    let builtin = KnowledgeBase::builtin()?;
    match &config.knowledge_path {
        Some(path) => {
            let overlay = KnowledgeBase::from_file(path).map_err(|e| {
                AppError::config(format!(
                    "Failed to load knowledge table {}: {}",
                    path.display(),
                    e
                ))
            })?;
            tracing::info!(
                "[State] Overlaying {} knowledge entries from {}",
                overlay.len(),
                path.display()
            );
            Ok(builtin.merged_with(overlay))
        }
        None => Ok(builtin),
    }
}
