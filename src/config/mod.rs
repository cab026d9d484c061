use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::core::utils::{ensure_dir, PathResolver};
use crate::currency::{CurrencyCode, LocaleConfig};
use crate::errors::{BudgetError, Result};
use crate::storage::file_store::DEFAULT_RETENTION;
use crate::utils::persistence::{
    backup_file_name, list_backup_files, prune_backup_files, write_atomic,
};

const CONFIG_BACKUP_STEM: &str = "config";
const MAX_PROJECTION_MONTHS: usize = 120;

/// User preferences persisted in `<home>/config/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_template: Option<String>,
    pub color_output: bool,
    pub projection_months: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "fr-FR".into(),
            currency: "EUR".into(),
            backup_retention: DEFAULT_RETENTION,
            default_template: None,
            color_output: true,
            projection_months: 12,
        }
    }
}

impl Config {
    pub fn locale_config(&self) -> LocaleConfig {
        LocaleConfig::for_tag(&self.locale)
    }

    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.as_str())
    }

    /// Updates one setting from its textual form, as typed in `config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "locale" => {
                if value.is_empty() {
                    return Err(BudgetError::Config("locale cannot be empty".into()));
                }
                self.locale = value.to_string();
            }
            "currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(BudgetError::Config(format!(
                        "`{}` is not a three-letter currency code",
                        value
                    )));
                }
                self.currency = value.to_ascii_uppercase();
            }
            "backup_retention" => {
                self.backup_retention = parse_count(key, value, 1, usize::MAX)?;
            }
            "default_template" => {
                self.default_template = match value {
                    "" | "none" => None,
                    other => Some(other.to_string()),
                };
            }
            "color_output" => {
                self.color_output = parse_switch(key, value)?;
            }
            "projection_months" => {
                self.projection_months = parse_count(key, value, 1, MAX_PROJECTION_MONTHS)?;
            }
            other => {
                return Err(BudgetError::Config(format!("unknown setting `{}`", other)));
            }
        }
        Ok(())
    }

    /// `(key, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("backup_retention", self.backup_retention.to_string()),
            (
                "default_template",
                self.default_template
                    .clone()
                    .unwrap_or_else(|| "none".into()),
            ),
            ("color_output", self.color_output.to_string()),
            ("projection_months", self.projection_months.to_string()),
        ]
    }
}

fn parse_count(key: &str, value: &str, min: usize, max: usize) -> Result<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|count| (min..=max).contains(count))
        .ok_or_else(|| {
            BudgetError::Config(format!(
                "{} must be a whole number between {} and {}",
                key, min, max
            ))
        })
}

fn parse_switch(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(BudgetError::Config(format!("{} must be on or off", key))),
    }
}

pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "ignoring unreadable configuration"
                );
                Ok(Config::default())
            }
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String> {
        ensure_dir(&self.backups_dir)?;
        let name = backup_file_name(CONFIG_BACKUP_STEM, note);
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.backups_dir.join(&name), &json)?;
        prune_backup_files(&self.backups_dir, config.backup_retention)?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<Config> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(BudgetError::Config(format!(
                "configuration backup `{}` not found",
                backup_name
            )));
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        self.save(&config)?;
        Ok(config)
    }

    pub fn list_backups(&self) -> Result<Vec<String>> {
        list_backup_files(&self.backups_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_backup_restore() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("currency", "usd").unwrap();
        manager.save(&config).unwrap();
        let backup = manager.backup(&config, Some("before locale")).unwrap();
        assert!(backup.ends_with("_before-locale.json"));

        config.set("locale", "en-US").unwrap();
        manager.save(&config).unwrap();
        let restored = manager.restore(&backup).unwrap();
        assert_eq!(restored.locale, "fr-FR");
        assert_eq!(manager.load().unwrap().currency, "USD");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("currency", "euro").is_err());
        assert!(config.set("projection_months", "0").is_err());
        assert!(config.set("color_output", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());
        config.set("color-output", "off").unwrap();
        assert!(!config.color_output);
    }

    #[test]
    fn partial_files_fill_defaults() {
        let config: Config = serde_json::from_str(r#"{"currency":"CHF"}"#).unwrap();
        assert_eq!(config.currency, "CHF");
        assert_eq!(config.projection_months, 12);
    }
}
