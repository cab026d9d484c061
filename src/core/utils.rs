use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

pub const HOME_ENV: &str = "MAPOCKET_HOME";

const DEFAULT_DIR_NAME: &str = ".mapocket";
const STORE_DIR: &str = "store";
const BACKUP_DIR: &str = "backups";
const CONFIG_DIR: &str = "config";
const CONFIG_BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";

/// Resolves the on-disk layout under the application home.
///
/// ```text
/// <home>/store/<key>.json
/// <home>/backups/<key>/<key>_<timestamp>.json
/// <home>/config/config.json
/// <home>/config/backups/config_<timestamp>.json
/// ```
pub struct PathResolver;

impl PathResolver {
    /// `MAPOCKET_HOME` when set, `~/.mapocket` otherwise.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(Self::base_dir)
    }

    pub fn store_dir_in(base: &Path) -> PathBuf {
        base.join(STORE_DIR)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn config_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_FILE)
    }

    pub fn config_backup_dir_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_BACKUP_DIR)
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
