//! File helpers shared by the key/value store and the configuration manager.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::core::utils::ensure_dir;
use crate::errors::Result;

pub const BACKUP_EXTENSION: &str = "json";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";

/// Writes `data` next to `path` and renames it into place.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// `<stem>_<YYYYmmdd_HHMM>[_<note>].json`
pub fn backup_file_name(stem: &str, note: Option<&str>) -> String {
    let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
    let mut name = format!("{}_{}", stem, timestamp);
    if let Some(label) = sanitize_note(note) {
        name.push('_');
        name.push_str(&label);
    }
    name.push('.');
    name.push_str(BACKUP_EXTENSION);
    name
}

pub fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if ch.is_whitespace() || matches!(ch, '-' | '.') {
            if !sanitized.is_empty() && !last_dash {
                sanitized.push('-');
                last_dash = true;
            }
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Extracts the timestamp from a backup file name, ignoring an optional note.
pub fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date_part, time_part) = (pair[0], pair[1]);
        if !is_digits(date_part, 8) || !is_digits(time_part, 4) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", date_part, time_part), "%Y%m%d%H%M")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

/// Lists backup files in `dir`, newest first.
pub fn list_backup_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            entries.push(name.to_string());
        }
    }
    entries.sort_by(|a, b| {
        parse_backup_timestamp(b)
            .cmp(&parse_backup_timestamp(a))
            .then_with(|| b.cmp(a))
    });
    Ok(entries)
}

/// Deletes everything past the newest `retention` backups in `dir`.
pub fn prune_backup_files(dir: &Path, retention: usize) -> Result<usize> {
    let backups = list_backup_files(dir)?;
    let mut removed = 0;
    for name in backups.iter().skip(retention.max(1)) {
        if fs::remove_file(dir.join(name)).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_note(Some("  Before cleanup. v2 ")),
            Some("before-cleanup-v2".into())
        );
        assert_eq!(sanitize_note(Some("***")), None);
        assert_eq!(sanitize_note(None), None);
    }

    #[test]
    fn timestamps_parse_with_or_without_note() {
        let plain = parse_backup_timestamp("mapocket_projects_20250102_0304.json").unwrap();
        let noted = parse_backup_timestamp("config_20250102_0304_manual.json").unwrap();
        assert_eq!(plain, noted);
        assert!(parse_backup_timestamp("notes.txt").is_none());
    }

    #[test]
    fn prune_keeps_newest() {
        let dir = TempDir::new().unwrap();
        for stamp in ["20240101_0000", "20240201_0000", "20240301_0000"] {
            fs::write(dir.path().join(format!("k_{}.json", stamp)), "[]").unwrap();
        }
        assert_eq!(prune_backup_files(dir.path(), 2).unwrap(), 1);
        let left = list_backup_files(dir.path()).unwrap();
        assert_eq!(left, vec!["k_20240301_0000.json", "k_20240201_0000.json"]);
    }

    #[test]
    fn atomic_write_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("value.json");
        write_atomic(&target, "{}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
        assert!(!tmp_path(&target).exists());
    }
}
