//! SQLite Database
//!
//! Embedded database for persistent storage using rusqlite with r2d2 connection pooling.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_dir, DatabaseLocation};

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled connection checked out for a single operation
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        plant_name TEXT NOT NULL,
        predicted_disease TEXT NOT NULL,
        category TEXT NOT NULL,
        confidence_score REAL NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_predictions_created_at
        ON predictions(created_at DESC)",
    "CREATE TABLE IF NOT EXISTS user_registrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
];

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a database from an existing connection pool.
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create an in-memory database.
    ///
    /// A single pooled connection that is never recycled, so the data
    /// lives as long as the pool.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .build(manager)
            .map_err(|e| AppError::store(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open a file-backed pool without touching the file.
    ///
    /// Connections are established on first use, so an unreachable file
    /// surfaces as `StoreUnavailable` from individual operations instead of
    /// failing startup. Call [`Database::init_schema`] afterwards.
    pub fn connect(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = ensure_dir(parent) {
                tracing::warn!(
                    "[Database] Could not create {}, continuing: {}",
                    parent.display(),
                    e
                );
            }
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(Duration::from_millis(5000))
        });
        let pool = Pool::builder()
            .max_size(10)
            .connection_timeout(Duration::from_secs(5))
            .build_unchecked(manager);

        Ok(Self { pool })
    }

    /// Open the database named by a parsed connection URL.
    pub fn open(location: &DatabaseLocation) -> AppResult<Self> {
        match location {
            DatabaseLocation::Memory => Self::new_in_memory(),
            DatabaseLocation::File(path) => Self::connect(path),
        }
    }

    /// Initialize the database schema. Idempotent.
    pub fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;
        for statement in SCHEMA {
            conn.execute(statement, [])?;
        }
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }
}
