use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::core::utils::{ensure_dir, PathResolver};
use crate::errors::{BudgetError, Result};
use crate::utils::persistence::{
    backup_file_name, list_backup_files, prune_backup_files, write_atomic,
};

use super::KeyValueStore;

const VALUE_EXTENSION: &str = "json";
pub const DEFAULT_RETENTION: usize = 5;

/// Stores each key as `<root>/store/<key>.json`.
///
/// Overwriting or removing a key first copies the previous document to
/// `<root>/backups/<key>/`, keeping the newest `retention` copies.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    store_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl FileStore {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = PathResolver::resolve_base(root);
        ensure_dir(&root)?;
        let store_dir = PathResolver::store_dir_in(&root);
        let backups_dir = PathResolver::backup_dir_in(&root);
        ensure_dir(&store_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root,
            store_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn value_path(&self, key: &str) -> PathBuf {
        self.store_dir
            .join(format!("{}.{}", file_name(key), VALUE_EXTENSION))
    }

    fn backup_dir(&self, key: &str) -> PathBuf {
        self.backups_dir.join(file_name(key))
    }

    /// Backup file names for `key`, newest first.
    pub fn list_backups(&self, key: &str) -> Result<Vec<String>> {
        list_backup_files(&self.backup_dir(key))
    }

    /// Copies a backup over the current value of `key`.
    pub fn restore_backup(&self, key: &str, backup_name: &str) -> Result<()> {
        let source = self.backup_dir(key).join(backup_name);
        if !source.exists() {
            return Err(BudgetError::Storage(format!(
                "backup `{}` not found for key `{}`",
                backup_name, key
            )));
        }
        let data = fs::read_to_string(&source)?;
        self.set(key, &data)
    }

    fn backup_existing(&self, key: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(key);
        ensure_dir(&dir)?;
        let target = dir.join(backup_file_name(&file_name(key), None));
        fs::copy(path, &target)?;
        let pruned = prune_backup_files(&dir, self.retention)?;
        if pruned > 0 {
            debug!(key, pruned, "pruned old backups");
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key);
        if let Err(err) = self.backup_existing(key, &path) {
            warn!(key, error = %err, "could not back up previous value");
        }
        write_atomic(&path, value)?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key);
        if !path.exists() {
            return Ok(());
        }
        self.backup_existing(key, &path)?;
        fs::remove_file(&path)?;
        debug!(key, "removed value");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.store_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Maps a key to a file stem. Case is preserved so `savedProjects` and
/// `savedprojects` stay distinct.
fn file_name(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "value".into()
    } else {
        sanitized
    }
}
