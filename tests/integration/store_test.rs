//! Record Store Integration Tests
//!
//! SQLite persistence on disk:
//! - Idempotent schema initialization
//! - Durability across reopen
//! - Stats ranking and the degraded summary

use plant_health_core::DiagnosisRecord;
use plant_health_server::{Database, RecordStore, Registration, SqliteRecordStore};

fn record(plant: &str, disease: &str) -> DiagnosisRecord {
    DiagnosisRecord {
        filename: "leaf.jpg".to_string(),
        plant_name: plant.to_string(),
        predicted_disease: disease.to_string(),
        category: "Fungal".to_string(),
        confidence_score: 0.8,
    }
}

#[tokio::test]
async fn test_schema_init_twice_is_harmless() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plant_health.db");
    let db = Database::connect(&path).unwrap();

    db.init_schema().unwrap();
    db.init_schema().unwrap();

    let store = SqliteRecordStore::new(db.clone());
    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();

    let conn = db.get_connection().unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'predictions'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 1);
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plant_health.db");

    {
        let store = SqliteRecordStore::new(Database::connect(&path).unwrap());
        store.save(&record("Apple", "Apple scab")).await.unwrap();
        store.save(&record("Grape", "Black rot")).await.unwrap();
    }

    let reopened = SqliteRecordStore::new(Database::connect(&path).unwrap());
    assert_eq!(reopened.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_stats_rank_and_break_ties() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SqliteRecordStore::new(Database::connect(&tmp.path().join("s.db")).unwrap());

    for (plant, disease) in [
        ("Tomato", "Late blight"),
        ("Tomato", "Late blight"),
        ("Tomato", "Late blight"),
        ("Potato", "Early blight"),
        ("Potato", "Early blight"),
        ("Grape", "Black rot"),
        ("Apple", "Apple scab"),
        ("Corn (maize)", "Common rust "),
    ] {
        store.save(&record(plant, disease)).await.unwrap();
    }

    let stats = store.recent_stats().await.unwrap();
    assert_eq!(stats.total_predictions, 8);
    assert_eq!(
        stats.common_diseases,
        vec![
            "Tomato Late blight".to_string(),
            "Potato Early blight".to_string(),
            "Apple Apple scab".to_string(),
        ]
    );
    assert_eq!(stats.top_plant, "Tomato");
}

#[tokio::test]
async fn test_stats_after_table_dropped() {
    let db = Database::new_in_memory().unwrap();
    let store = SqliteRecordStore::new(db.clone());
    store.save(&record("Apple", "healthy")).await.unwrap();

    db.get_connection()
        .unwrap()
        .execute("DROP TABLE predictions", [])
        .unwrap();

    let stats = store.recent_stats().await.unwrap();
    assert_eq!(stats.total_predictions, 0);
    assert_eq!(stats.top_plant, "None");
}

#[tokio::test]
async fn test_unreachable_database_reports_store_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    // The temp dir itself is not a database file.
    let store = SqliteRecordStore::new(Database::connect(tmp.path()).unwrap());

    let err = store.recent_stats().await.unwrap_err();
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_registrations_persist() {
    let db = Database::new_in_memory().unwrap();
    let store = SqliteRecordStore::new(db.clone());
    store
        .register(&Registration {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
        })
        .await
        .unwrap();

    let conn = db.get_connection().unwrap();
    let (email, phone): (String, String) = conn
        .query_row(
            "SELECT email, phone FROM user_registrations WHERE name = 'Grace'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(email, "grace@example.com");
    assert_eq!(phone, "+1 555 0100");
}
