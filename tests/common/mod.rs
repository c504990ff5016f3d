use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use procurai::storage::{KeyValueStore, SqliteKvStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<dyn KeyValueStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("store.db");
    let store = SqliteKvStore::new_with_path(db_path).expect("failed to create sqlite store");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn reopen_store(tmp: &TempDir) -> Arc<dyn KeyValueStore> {
    let store = SqliteKvStore::new_with_path(tmp.path().join("store.db"))
        .expect("failed to reopen sqlite store");
    Arc::new(store)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn stream_body(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}
