//! User settings, stored as JSON under the platform config directory.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::descriptor::model::DEFAULT_STEP_TOLERANCE;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Accept `cols` entries that have no column section
    pub allow_free_form_columns: bool,
    /// Treat warnings as failures
    pub strict: bool,
    /// Relative tolerance for step alignment checks (default: 1e-9)
    pub step_tolerance: f64,
    /// Offending values quoted per column in data checks (default: 5)
    pub max_examples_per_column: usize,
    /// Report format when none is given on the command line: "text" or "json"
    pub default_format: String,
    /// Also write logs to the rolling files in the data directory
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_free_form_columns: false,
            strict: false,
            step_tolerance: DEFAULT_STEP_TOLERANCE,
            max_examples_per_column: 5,
            default_format: "text".to_owned(),
            log_to_file: false,
        }
    }
}

pub fn get_config_path() -> PathBuf {
    crate::utils::config_dir().join(CONFIG_FILE_NAME)
}

/// Load settings from the default location.
///
/// # Errors
///
/// See [`load_settings_at`].
pub fn load_settings() -> Result<Settings> {
    load_settings_at(&get_config_path())
}

/// Load settings from `path`, or defaults when no file exists there.
///
/// Logging is usually not installed yet when settings are read, so an
/// unreadable file is returned as an error for the caller to report.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_settings_at(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    load_settings_from(path)
}

/// Load settings from a specific file. Missing fields take their defaults.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid JSON.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse settings JSON")
}

/// Save settings to the default location.
///
/// # Errors
///
/// Returns error if the directory or file cannot be written.
pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let path = get_config_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

/// Save settings to a specific file, creating parent directories.
///
/// # Errors
///
/// Returns error if the directory or file cannot be written.
pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let settings = Settings {
            strict: true,
            max_examples_per_column: 2,
            ..Settings::default()
        };
        save_settings_to(&settings, &path).unwrap();

        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "allow_free_form_columns": true }"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert!(settings.allow_free_form_columns);
        assert_eq!(settings.default_format, "text");
        assert_eq!(settings.max_examples_per_column, 5);
    }

    #[test]
    fn test_invalid_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        assert!(load_settings_from(&path).is_err());

        let err = load_settings_at(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse settings JSON"));
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        assert_eq!(load_settings_at(&path).unwrap(), Settings::default());
    }
}
