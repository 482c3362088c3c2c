//! JSON Configuration Management
//!
//! Loads the server configuration from an optional JSON file and applies
//! environment overrides on top.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::user_config_path;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PLANT_HEALTH_CONFIG";

/// Configuration service for server settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: Option<PathBuf>,
    config: AppConfig,
}

impl ConfigService {
    /// Load from `PLANT_HEALTH_CONFIG` (or the per-user config file when it
    /// exists), then apply process environment overrides.
    pub fn from_env() -> AppResult<Self> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => user_config_path().ok().filter(|p| p.exists()),
        };
        Self::load(path, |name| std::env::var(name).ok())
    }

    /// Load configuration from `path` when given, otherwise defaults, then
    /// apply overrides through `lookup`.
    pub fn load<F>(path: Option<PathBuf>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &path {
            Some(path) => Self::load_from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env(lookup).map_err(AppError::config)?;
        config.validate().map_err(AppError::config)?;

        tracing::debug!(
            "[Config] Loaded configuration from {}",
            path.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string())
        );

        Ok(Self {
            config_path: path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> AppConfig {
        self.config.clone()
    }

    /// File the configuration was read from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.as_deref().map_or(true, Path::exists) && self.config.validate().is_ok()
    }
}
