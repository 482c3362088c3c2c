//! Path Utilities
//!
//! Resolves the database location from a connection URL and the default
//! config, database, and scratch locations.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Directory used for writable state on read-only serverless hosts.
pub const SERVERLESS_TMP_DIR: &str = "/tmp";

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

/// Parse a `sqlite:` connection URL.
///
/// Accepts `sqlite::memory:`, `sqlite:///relative/or/./path.db`,
/// `sqlite:////absolute/path.db`, and a bare file path.
pub fn parse_database_url(url: &str) -> AppResult<DatabaseLocation> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::config("database_url is empty"));
    }
    if url == "sqlite::memory:" || url == "sqlite://:memory:" || url == ":memory:" {
        return Ok(DatabaseLocation::Memory);
    }

    let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
        rest
    } else if let Some(rest) = url.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = url.strip_prefix("sqlite:") {
        rest
    } else if url.contains("://") {
        return Err(AppError::config(format!(
            "Unsupported database URL '{}': only sqlite is supported",
            url
        )));
    } else {
        url
    };

    if path.is_empty() {
        return Err(AppError::config(format!("Database URL '{}' has no path", url)));
    }
    Ok(DatabaseLocation::File(PathBuf::from(path)))
}

/// Whether the process runs on a serverless host with a read-only bundle.
pub fn is_serverless() -> bool {
    std::env::var_os("VERCEL").is_some()
}

/// Default database URL for the current host.
pub fn default_database_url() -> String {
    if is_serverless() {
        format!("sqlite:///{}/plant_health.db", SERVERLESS_TMP_DIR)
    } else {
        "sqlite:///./plant_health.db".to_string()
    }
}

/// Default scratch directory for uploads.
pub fn default_uploads_dir() -> PathBuf {
    if is_serverless() {
        Path::new(SERVERLESS_TMP_DIR).join("uploads")
    } else {
        PathBuf::from("uploads")
    }
}

/// Per-user config file (`<config dir>/plant-health/config.json`).
pub fn user_config_path() -> AppResult<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| AppError::config("Could not determine config directory"))?;
    Ok(dir.join("plant-health").join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
