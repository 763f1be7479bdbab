use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use bella::chat::{ConversationHistory, Dispatcher};
use bella::config::{ApiConfig, ProviderSettings};
use bella::preferences::PreferenceStore;
use bella::providers::{ProviderRegistry, SamplingParams};
use bella::storage::{MemoryStore, SqliteStore};

/// Dispatcher whose provider points at a mock server path
#[allow(dead_code)]
pub fn dispatcher_for(provider: &str, endpoint: String, key: Option<&str>) -> Dispatcher {
    let mut api = ApiConfig::default();
    api.providers.insert(
        provider.to_string(),
        ProviderSettings {
            endpoint: Some(endpoint),
            model: None,
            api_key: key.map(str::to_string),
        },
    );
    let registry = ProviderRegistry::from_config(&api).expect("failed to build registry");
    Dispatcher::new(
        registry,
        ConversationHistory::new(15),
        provider,
        SamplingParams::default(),
        Duration::from_secs(5),
    )
    .expect("failed to build dispatcher")
}

#[allow(dead_code)]
pub fn memory_preferences() -> PreferenceStore {
    PreferenceStore::new(Arc::new(MemoryStore::new()))
}

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("preferences.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
