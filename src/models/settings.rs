//! Settings Models
//!
//! Server configuration and settings data structures.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use plant_health_vision::{ClientConfig, ProviderKind};

use crate::utils::paths::{default_database_url, default_uploads_dir, parse_database_url};

/// Default request body limit for uploads (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound for the remote diagnosis deadline
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Server configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// `sqlite:///<path>` or `sqlite::memory:`
    pub database_url: String,
    /// Scratch directory for uploaded images
    pub uploads_dir: PathBuf,
    /// Optional JSON table overlaid on the built-in knowledge base
    pub knowledge_path: Option<PathBuf>,
    /// Maximum accepted request body size
    pub max_upload_bytes: usize,
    /// Accuracy figure reported by `/stats`
    pub model_accuracy: String,
    /// Remote vision model settings
    pub vision: VisionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            database_url: default_database_url(),
            uploads_dir: default_uploads_dir(),
            knowledge_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            model_accuracy: "95%".to_string(),
            vision: VisionSettings::default(),
        }
    }
}

/// Remote vision model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub provider: ProviderKind,
    /// Falls back to the provider's default model
    pub model: Option<String>,
    /// Only ever read from the environment or the config file; never written back
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            proxy_url: None,
        }
    }
}

impl VisionSettings {
    /// Effective model name
    pub fn model_name(&self) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
            .to_string()
    }

    /// Build the client configuration, offering `label_hints` to the model.
    pub fn to_client_config(&self, label_hints: Vec<String>) -> ClientConfig {
        let mut config = ClientConfig::new(self.provider);
        config.model = self.model_name();
        config.api_key = self.api_key.clone().filter(|k| !k.trim().is_empty());
        config.base_url = self.base_url.clone();
        config.timeout_secs = self.timeout_secs;
        config.proxy_url = self.proxy_url.clone();
        config.label_hints = label_hints;
        config
    }
}

/// Settings update (partial update), built from environment overrides
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub bind_address: Option<String>,
    pub database_url: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub knowledge_path: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub proxy_url: Option<String>,
}

impl SettingsUpdate {
    /// Collect overrides through `lookup` (normally `std::env::var`).
    ///
    /// Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match get("VISION_PROVIDER") {
            Some(value) => Some(
                value
                    .parse::<ProviderKind>()
                    .map_err(|e| format!("VISION_PROVIDER: {}", e))?,
            ),
            None => None,
        };
        let timeout_secs = match get("VISION_TIMEOUT_SECS") {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| format!("VISION_TIMEOUT_SECS must be an integer, got '{}'", value))?,
            ),
            None => None,
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS"),
            database_url: get("DATABASE_URL"),
            uploads_dir: get("UPLOADS_PATH").map(PathBuf::from),
            knowledge_path: get("KNOWLEDGE_PATH").map(PathBuf::from),
            provider,
            model: get("VISION_MODEL"),
            base_url: get("VISION_BASE_URL"),
            timeout_secs,
            proxy_url: get("VISION_PROXY_URL"),
        })
    }
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(bind_address) = update.bind_address {
            self.bind_address = bind_address;
        }
        if let Some(database_url) = update.database_url {
            self.database_url = database_url;
        }
        if let Some(uploads_dir) = update.uploads_dir {
            self.uploads_dir = uploads_dir;
        }
        if let Some(knowledge_path) = update.knowledge_path {
            self.knowledge_path = Some(knowledge_path);
        }
        if let Some(provider) = update.provider {
            self.vision.provider = provider;
        }
        if let Some(model) = update.model {
            self.vision.model = Some(model);
        }
        if let Some(base_url) = update.base_url {
            self.vision.base_url = Some(base_url);
        }
        if let Some(timeout) = update.timeout_secs {
            self.vision.timeout_secs = timeout;
        }
        if let Some(proxy_url) = update.proxy_url {
            self.vision.proxy_url = Some(proxy_url);
        }
    }

    /// Apply environment overrides, then pick the API key for the
    /// effective provider.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let update = SettingsUpdate::from_lookup(&lookup)?;
        self.apply_update(update);

        let key_vars: &[&str] = match self.vision.provider {
            ProviderKind::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderKind::OpenAI => &["OPENAI_API_KEY"],
        };
        if let Some(key) = key_vars
            .iter()
            .filter_map(|&name| lookup(name))
            .find(|v| !v.trim().is_empty())
        {
            self.vision.api_key = Some(key.trim().to_string());
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|_| format!("Invalid bind_address: {}", self.bind_address))?;

        parse_database_url(&self.database_url).map_err(|e| e.to_string())?;

        if self.uploads_dir.as_os_str().is_empty() {
            return Err("uploads_dir must not be empty".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if self.vision.timeout_secs == 0 || self.vision.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(format!(
                "vision.timeout_secs must be between 1 and {}",
                MAX_TIMEOUT_SECS
            ));
        }

        if self.model_accuracy.trim().is_empty() {
            return Err("model_accuracy must not be empty".to_string());
        }

        Ok(())
    }
}
