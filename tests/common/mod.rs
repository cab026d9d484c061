use std::path::PathBuf;
use std::sync::Mutex;

use mapocket_core::{config::ConfigManager, core::WorkspaceManager, storage::FileStore};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a fresh data home that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated managers backed by unique directories for each test.
#[allow(dead_code)]
pub fn setup_test_env() -> (WorkspaceManager, ConfigManager, PathBuf) {
    let base = temp_home();
    let store = FileStore::new(Some(base.clone()), Some(3)).expect("create file store");
    let manager = WorkspaceManager::new(Box::new(store));
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (manager, config_manager, base)
}
