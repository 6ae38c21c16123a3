//! Hot reload against real files.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ox_service::config::watcher::ConfigWatcher;
use ox_service::config::{ConfigError, ConfigStore, LogLevel};

fn write_with_mtime(path: &Path, content: &str, offset_secs: u64) {
    fs::write(path, content).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

#[test]
fn test_modified_detection_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.json");
    write_with_mtime(&path, r#"{"server": {"port": 9000}}"#, 0);

    let store = ConfigStore::new();
    store.load_from_file(&path).unwrap();
    assert_eq!(store.snapshot().server.port, 9000);
    assert!(!store.is_config_modified());

    write_with_mtime(
        &path,
        r#"{"server": {"port": 9100}, "log": {"level": "debug"}}"#,
        10,
    );
    assert!(store.is_config_modified());

    store.reload().unwrap();
    let config = store.snapshot();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.log.level, LogLevel::Debug);
    assert!(!store.is_config_modified());
}

#[test]
fn test_failed_reload_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.json");
    write_with_mtime(&path, r#"{"server": {"port": 9000, "threads": 8}}"#, 0);

    let store = ConfigStore::new();
    store.load_from_file(&path).unwrap();
    let before = store.snapshot();

    write_with_mtime(&path, r#"{"server": {"port": 9100, "threads": "#, 10);
    assert!(matches!(store.reload(), Err(ConfigError::Parse(_))));

    assert_eq!(*store.snapshot(), *before);
    // Still dirty, so the next save gets picked up.
    assert!(store.is_config_modified());
}

#[test]
fn test_toml_file_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.toml");
    fs::write(
        &path,
        "[server]\nport = 7000\n\n[ox_sdk]\ndll_path = \"/opt/ox/ox.dll\"\n",
    )
    .unwrap();

    let store = ConfigStore::new();
    store.load_from_file(&path).unwrap();
    let config = store.snapshot();
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.sdk.dll_path, "/opt/ox/ox.dll");
    assert!(store.is_valid());
}

#[tokio::test]
async fn test_watcher_publishes_new_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.json");
    write_with_mtime(&path, r#"{"log": {"level": "info"}}"#, 0);

    let store = Arc::new(ConfigStore::new());
    store.load_from_file(&path).unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(store.clone()).unwrap();
    let _handle = watcher.run().unwrap();

    write_with_mtime(&path, r#"{"log": {"level": "error"}}"#, 10);

    let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("no reload observed")
        .unwrap();
    assert_eq!(config.log.level, LogLevel::Error);
    assert_eq!(store.snapshot().log.level, LogLevel::Error);
}

#[test]
fn test_watcher_requires_path() {
    let store = Arc::new(ConfigStore::new());
    assert!(ConfigWatcher::new(store).is_none());
}
