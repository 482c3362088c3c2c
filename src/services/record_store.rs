//! Record Store
//!
//! Persists diagnosis records and user registrations and answers aggregate
//! statistics queries.
//!
//! ## Implementations
//! - `SqliteRecordStore` - durable, for production
//! - `InMemoryRecordStore` - for development and testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use plant_health_core::DiagnosisRecord;

use crate::storage::database::Database;
use crate::utils::error::{AppError, AppResult};

/// Number of entries in `common_diseases`
pub const COMMON_DISEASE_LIMIT: usize = 3;

/// `top_plant` for an empty store
pub const NO_PLANT: &str = "None";

/// Aggregate summary over persisted predictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_predictions: i64,
    /// Most frequent `"{plant} {disease}"` pairs, ties broken alphabetically
    pub common_diseases: Vec<String>,
    /// Most frequent plant, or `"None"`
    pub top_plant: String,
}

impl PredictionStats {
    fn empty() -> Self {
        Self {
            total_predictions: 0,
            common_diseases: Vec::new(),
            top_plant: NO_PLANT.to_string(),
        }
    }
}

/// A user registration submitted through `/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Trait for persisting diagnosis records.
///
/// Implementations must be thread-safe (Send + Sync). Every operation
/// acquires and releases its own connection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create tables if missing. Safe to call repeatedly.
    async fn ensure_schema(&self) -> AppResult<()>;

    /// Persist a record and return its identifier.
    async fn save(&self, record: &DiagnosisRecord) -> AppResult<i64>;

    /// Number of persisted records.
    async fn count(&self) -> AppResult<i64>;

    /// Aggregate summary for `/stats`.
    async fn recent_stats(&self) -> AppResult<PredictionStats>;

    /// Persist a registration and return its identifier.
    async fn register(&self, registration: &Registration) -> AppResult<i64>;

    /// Whether the store is reachable.
    async fn is_healthy(&self) -> bool;
}

/// Rank `(key, count)` pairs by count descending, then key ascending.
fn rank_by_frequency(counts: HashMap<String, i64>, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(String, i64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(key, _)| key).collect()
}

fn disease_key(plant_name: &str, predicted_disease: &str) -> String {
    format!("{} {}", plant_name, predicted_disease)
}

// ============================================================================
// SqliteRecordStore
// ============================================================================

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    db: Database,
    schema_ready: AtomicBool,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            schema_ready: AtomicBool::new(false),
        }
    }

    async fn ensure_schema_once(&self) -> AppResult<()> {
        if self.schema_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        self.ensure_schema().await
    }

    /// Run `op` on a pooled connection in the blocking thread pool.
    async fn with_connection<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> AppResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            op(&*conn)
        })
        .await
        .map_err(|e| AppError::store(format!("Task join error: {}", e)))?
        .map_err(into_store_error)
    }
}

/// Every persistence failure is reported as `StoreUnavailable`.
fn into_store_error(err: AppError) -> AppError {
    match err {
        AppError::StoreUnavailable(_) => err,
        other => AppError::store(other.to_string()),
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn ensure_schema(&self) -> AppResult<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.init_schema())
            .await
            .map_err(|e| AppError::store(format!("Task join error: {}", e)))?
            .map_err(into_store_error)?;
        self.schema_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn save(&self, record: &DiagnosisRecord) -> AppResult<i64> {
        self.ensure_schema_once().await?;
        let record = record.clone();
        let created_at = chrono::Utc::now().to_rfc3339();

        let id = self
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO predictions
                     (filename, plant_name, predicted_disease, category, confidence_score, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        record.filename,
                        record.plant_name,
                        record.predicted_disease,
                        record.category,
                        record.confidence_score,
                        created_at,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        tracing::debug!("[RecordStore] Saved prediction {}", id);
        Ok(id)
    }

    async fn count(&self) -> AppResult<i64> {
        self.ensure_schema_once().await?;
        self.with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?)
        })
        .await
    }

    async fn recent_stats(&self) -> AppResult<PredictionStats> {
        // Re-run before every stats query; the table may have been dropped
        // or the file recreated since startup.
        self.ensure_schema().await?;

        self.with_connection(|conn| {
            let total_predictions: i64 =
                conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT plant_name || ' ' || predicted_disease AS disease, COUNT(*) AS n
                 FROM predictions
                 GROUP BY disease
                 ORDER BY n DESC, disease ASC
                 LIMIT ?1",
            )?;
            let common_diseases = stmt
                .query_map(rusqlite::params![COMMON_DISEASE_LIMIT as i64], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let top_plant: Option<String> = match conn.query_row(
                "SELECT plant_name, COUNT(*) AS n
                 FROM predictions
                 GROUP BY plant_name
                 ORDER BY n DESC, plant_name ASC
                 LIMIT 1",
                [],
                |row| row.get(0),
            ) {
                Ok(plant) => Some(plant),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };

            Ok(PredictionStats {
                total_predictions,
                common_diseases,
                top_plant: top_plant.unwrap_or_else(|| NO_PLANT.to_string()),
            })
        })
        .await
    }

    async fn register(&self, registration: &Registration) -> AppResult<i64> {
        self.ensure_schema_once().await?;
        let registration = registration.clone();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO user_registrations (name, email, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    registration.name,
                    registration.email,
                    registration.phone,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn is_healthy(&self) -> bool {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.is_healthy())
            .await
            .unwrap_or(false)
    }
}

// ============================================================================
// InMemoryRecordStore
// ============================================================================

#[derive(Default)]
struct MemoryTables {
    predictions: Vec<(i64, DiagnosisRecord)>,
    registrations: Vec<(i64, Registration)>,
}

/// In-memory implementation of `RecordStore` for development and testing.
///
/// Data is lost when the process exits. [`InMemoryRecordStore::set_unavailable`]
/// makes every operation fail as an unreachable store would.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<MemoryTables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of persisted records, oldest first.
    pub async fn records(&self) -> Vec<DiagnosisRecord> {
        self.tables
            .read()
            .await
            .predictions
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Snapshot of persisted registrations, oldest first.
    pub async fn registrations(&self) -> Vec<Registration> {
        self.tables
            .read()
            .await
            .registrations
            .iter()
            .map(|(_, registration)| registration.clone())
            .collect()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::store("in-memory store marked unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn ensure_schema(&self) -> AppResult<()> {
        self.check_available()
    }

    async fn save(&self, record: &DiagnosisRecord) -> AppResult<i64> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let id = tables.predictions.len() as i64 + 1;
        tables.predictions.push((id, record.clone()));
        Ok(id)
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.tables.read().await.predictions.len() as i64)
    }

    async fn recent_stats(&self) -> AppResult<PredictionStats> {
        self.check_available()?;
        let tables = self.tables.read().await;
        if tables.predictions.is_empty() {
            return Ok(PredictionStats::empty());
        }

        let mut diseases: HashMap<String, i64> = HashMap::new();
        let mut plants: HashMap<String, i64> = HashMap::new();
        for (_, record) in &tables.predictions {
            *diseases
                .entry(disease_key(&record.plant_name, &record.predicted_disease))
                .or_insert(0) += 1;
            *plants.entry(record.plant_name.clone()).or_insert(0) += 1;
        }

        Ok(PredictionStats {
            total_predictions: tables.predictions.len() as i64,
            common_diseases: rank_by_frequency(diseases, COMMON_DISEASE_LIMIT),
            top_plant: rank_by_frequency(plants, 1)
                .into_iter()
                .next()
                .unwrap_or_else(|| NO_PLANT.to_string()),
        })
    }

    async fn register(&self, registration: &Registration) -> AppResult<i64> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let id = tables.registrations.len() as i64 + 1;
        tables.registrations.push((id, registration.clone()));
        Ok(id)
    }

    async fn is_healthy(&self) -> bool {
        self.check_available().is_ok()
    }
}
