//! Integration tests for the `banq-db` data layer.
//!
//! Every test builds its own storage directory of real `SQLite` files in a
//! temporary directory, so no external services are needed.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::path::Path;
use std::sync::Arc;

use banq_db::validate::scan;
use banq_db::{
    validate_all, ConnectionRegistry, DatabaseHandle, DbError, SqliteConfig, StartupError,
};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

/// Create `<name>.db` with a single-row `rates` table.
async fn create_db(dir: &Path, name: &str) {
    let options = SqliteConnectOptions::new()
        .filename(dir.join(format!("{name}.db")))
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::query("CREATE TABLE rates (stamp_iso TEXT NOT NULL, util_e18 REAL NOT NULL)")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("INSERT INTO rates VALUES ('2025-11-20 12:00:00', 0.5)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}

/// Write a file with a `.db` extension that is not an `SQLite` database.
fn create_corrupt(dir: &Path, name: &str) {
    std::fs::write(dir.join(format!("{name}.db")), vec![b'x'; 4096]).unwrap();
}

async fn storage_with(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        create_db(dir.path(), name).await;
    }
    dir
}

fn registry_for(dir: &TempDir) -> ConnectionRegistry {
    ConnectionRegistry::new(dir.path(), SqliteConfig::default())
}

// =============================================================================
// ConnectionRegistry
// =============================================================================

#[tokio::test]
async fn resolve_opens_existing_database() {
    let dir = storage_with(&["ri_test"]).await;
    let registry = registry_for(&dir);

    let handle = registry.resolve("ri_test").await.unwrap();
    assert_eq!(handle.name(), "ri_test");
    assert_eq!(handle.file_name(), "ri_test.db");

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM rates")
        .fetch_one(handle.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn resolve_missing_database_is_not_found() {
    let dir = storage_with(&["ri_test"]).await;
    let registry = registry_for(&dir);

    let err = registry.resolve("ri_missing").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref db_name } if db_name == "ri_missing"));
    assert_eq!(registry.opens_performed(), 0);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn resolve_rejects_path_like_names() {
    let dir = storage_with(&["ri_test"]).await;
    let registry = registry_for(&dir);

    for name in ["ri_/../ri_test", "../ri_test", "ri_test/", "/etc/passwd"] {
        let err = registry.resolve(name).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }), "{name}");
    }
    assert_eq!(registry.opens_performed(), 0);
}

#[tokio::test]
async fn resolve_reuses_cached_handle() {
    let dir = storage_with(&["ri_test"]).await;
    let registry = registry_for(&dir);

    let first = registry.resolve("ri_test").await.unwrap();
    let second = registry.resolve("ri_test").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.opens_performed(), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_opens_once() {
    let dir = storage_with(&["rt_race"]).await;
    let registry = Arc::new(registry_for(&dir));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.resolve("rt_race").await.unwrap() })
        })
        .collect();

    let mut handles: Vec<Arc<DatabaseHandle>> = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    assert_eq!(registry.opens_performed(), 1);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
}

#[tokio::test]
async fn handles_are_read_only() {
    let dir = storage_with(&["ri_test"]).await;
    let registry = registry_for(&dir);
    let handle = registry.resolve("ri_test").await.unwrap();

    let write = sqlx::query("INSERT INTO rates VALUES ('2025-12-01 00:00:00', 0.1)")
        .execute(handle.pool())
        .await;
    assert!(write.is_err());

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM rates")
        .fetch_one(handle.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn corrupt_database_fails_probe_and_is_not_cached() {
    let dir = TempDir::new().unwrap();
    create_corrupt(dir.path(), "ri_broken");
    let registry = registry_for(&dir);

    let err = registry.resolve("ri_broken").await.unwrap_err();
    assert!(matches!(err, DbError::Open { .. } | DbError::Probe { .. }));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn close_all_empties_registry() {
    let dir = storage_with(&["ri_a", "rt_b"]).await;
    let registry = registry_for(&dir);
    let handle = registry.resolve("ri_a").await.unwrap();
    registry.resolve("rt_b").await.unwrap();

    registry.close_all().await;

    assert!(registry.is_empty().await);
    assert!(handle.pool().is_closed());
}

// =============================================================================
// Startup validation
// =============================================================================

#[tokio::test]
async fn validate_all_accepts_valid_directory() {
    let dir = storage_with(&["ri_a", "rt_b"]).await;

    let report = validate_all(dir.path()).await.unwrap();
    assert_eq!(report.checked.len(), 2);
    assert!(report.is_valid());
}

#[tokio::test]
async fn validate_all_rejects_missing_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let err = validate_all(&missing).await.unwrap_err();
    assert!(matches!(err, StartupError::PathMissing(ref p) if *p == missing));
}

#[tokio::test]
async fn validate_all_rejects_empty_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a database").unwrap();

    let err = validate_all(dir.path()).await.unwrap_err();
    assert!(matches!(err, StartupError::NoDatabasesFound(_)));
}

#[tokio::test]
async fn validate_all_rejects_one_corrupt_database() {
    let dir = storage_with(&["ri_a", "rt_b"]).await;
    create_corrupt(dir.path(), "ri_corrupt");

    let err = validate_all(dir.path()).await.unwrap_err();
    assert!(matches!(
        err,
        StartupError::OneOrMoreInvalid {
            failed: 1,
            checked: 3
        }
    ));
}

#[tokio::test]
async fn scan_reports_every_file() {
    let dir = storage_with(&["ri_a", "rt_b"]).await;
    create_corrupt(dir.path(), "ri_corrupt");

    let report = scan(dir.path()).await.unwrap();

    let names: Vec<String> = report
        .checked
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["ri_a.db", "ri_corrupt.db", "rt_b.db"]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("ri_corrupt.db"));
}

#[cfg(unix)]
#[tokio::test]
async fn scan_follows_symlinks() {
    let target_dir = storage_with(&["ri_real"]).await;
    let link_dir = TempDir::new().unwrap();
    std::os::unix::fs::symlink(
        target_dir.path().join("ri_real.db"),
        link_dir.path().join("ri_link.db"),
    )
    .unwrap();

    let report = scan(link_dir.path()).await.unwrap();

    assert!(report.is_valid());
    assert!(report.checked[0].ends_with("ri_real.db"));
}
