//! Persistence round-trip and edge case tests.

use tempfile::TempDir;

use crate::cache::CacheEntry;
use crate::config::Config;
use crate::error::StoreError;
use crate::persistence::{load_json, save_json};
use quotabar_core::{Balance, ProviderKind, SnapshotStatus, UsageReport, UsageSnapshot};
use quotabar_fetch::testing::fixed_now;

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let config = Config {
        cache_ttl_secs: 120,
        providers: vec![ProviderKind::OpenRouter],
        ..Config::default()
    };

    save_json(&file_path, &config).await.unwrap();
    let loaded = Config::load_from(&file_path).unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"})).await.unwrap();

    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_save_overwrites_existing() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("test.json");

    save_json(&file_path, &serde_json::json!({"version": 1})).await.unwrap();
    save_json(&file_path, &serde_json::json!({"version": 2})).await.unwrap();

    let loaded: serde_json::Value = load_json(&file_path).await.unwrap();
    assert_eq!(loaded["version"], 2);
}

#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result: Result<serde_json::Value, _> = load_json(&temp_dir.path().join("absent.json")).await;

    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[tokio::test]
async fn test_load_invalid_json_is_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("invalid.json");
    tokio::fs::write(&file_path, "{ not valid json }").await.unwrap();

    let result: Result<serde_json::Value, _> = load_json(&file_path).await;

    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

// ============================================================================
// Cache Document Tests
// ============================================================================

#[tokio::test]
async fn test_cache_entry_roundtrip_keeps_optional_fields() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("usage.json");

    let mut snapshot = UsageSnapshot::new(ProviderKind::OpenRouter, SnapshotStatus::Ok);
    snapshot.balance = Some(Balance::new(20.0, 7.25));
    snapshot.dashboard_url = Some("https://openrouter.ai/credits".to_string());
    let report: UsageReport = std::iter::once(snapshot).collect();

    let entry = CacheEntry::new(report, fixed_now());
    save_json(&file_path, &entry).await.unwrap();
    let loaded: CacheEntry = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, entry);
}

#[tokio::test]
async fn test_cache_entry_accepts_foreign_writer() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("usage.json");
    tokio::fs::write(
        &file_path,
        r#"{"timestamp": 1735898400.5, "data": {"zai": {"provider": "zai", "status": "error", "hints": ["x"]}}}"#,
    )
    .await
    .unwrap();

    let loaded: CacheEntry = load_json(&file_path).await.unwrap();

    assert!((loaded.timestamp - 1_735_898_400.5).abs() < f64::EPSILON);
    let zai = loaded.data.get(ProviderKind::Zai).unwrap();
    assert!(zai.is_error());
    assert_eq!(zai.hints, vec!["x".to_string()]);
}
