//! Configuration management for murmur.
//!
//! The configuration is a small JSON object holding the selected input
//! device and model. It is read once at startup and written back when
//! listening starts, so a bad or missing file falls back to defaults
//! rather than failing the application.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::APP_NAME;

/// Persisted selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Name of the selected input device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microphone: Option<String>,

    /// Name of the selected model subdirectory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Config {
    /// Get the selected microphone name.
    pub fn microphone(&self) -> Option<&str> {
        self.microphone.as_deref()
    }

    /// Get the selected model name.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.json", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir
            .join(APP_NAME)
            .join(format!("{}.json", APP_NAME)))
    }

    /// Loads the configuration from the config file. A missing or
    /// unreadable or corrupt file yields the default configuration.
    pub fn load(&self) -> Config {
        self.try_load().unwrap_or_default()
    }

    /// Loads the configuration, reporting whether a file was actually
    /// read. `None` means missing, unreadable, or corrupt; the latter two
    /// warn.
    pub fn try_load(&self) -> Option<Config> {
        if !self.config_path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = ?self.config_path, "Failed to read config file: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = ?self.config_path, "Failed to parse config file: {}", e);
                None
            }
        }
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }

    /// Returns the path of the append-only log file, next to the config.
    pub fn log_path(&self) -> PathBuf {
        self.config_path.with_file_name(format!("{}.log", APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_is_default() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());
        assert_eq!(manager.load(), Config::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());

        let config = Config {
            microphone: Some("USB Microphone".to_string()),
            model: Some("vosk-model-small-en-us-0.15".to_string()),
        };
        manager.save(&config).unwrap();

        let loaded = manager.load();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());

        std::fs::write(manager.config_path(), "{not json").unwrap();
        assert_eq!(manager.load(), Config::default());
    }

    #[test]
    fn test_try_load_reports_whether_a_file_was_read() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());

        assert_eq!(manager.try_load(), None);

        manager.save(&Config::default()).unwrap();
        assert_eq!(manager.try_load(), Some(Config::default()));

        std::fs::write(manager.config_path(), "{not json").unwrap();
        assert_eq!(manager.try_load(), None);
    }

    #[test]
    fn test_save_creates_config_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());

        manager.save(&Config::default()).unwrap();
        assert!(manager.config_path().exists());
    }

    #[test]
    fn test_serialized_shape_is_flat_json() {
        let config = Config {
            microphone: Some("default".to_string()),
            model: Some("small".to_string()),
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(value["microphone"], "default");
        assert_eq!(value["model"], "small");
    }

    #[test]
    fn test_log_path_is_sibling_of_config() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());
        assert_eq!(manager.log_path().parent(), manager.config_path().parent());
    }
}
