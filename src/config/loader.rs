use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/prefbridge/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("prefbridge").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Loads, parses and validates configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Identifiers and names are non-empty
    /// - Host and module identifiers differ
    /// - The app folder and preferences name are single path components
    /// - List keys contain no spaces
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;

        for (field, value) in [
            ("layout.app_folder", &layout.app_folder),
            ("layout.host_id", &layout.host_id),
            ("layout.module_id", &layout.module_id),
            ("paths.preferences_name", &self.paths.preferences_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("'{}' must not be empty", field),
                });
            }
        }

        if layout.host_id == layout.module_id {
            return Err(ConfigError::ValidationError {
                message: "Host and module identifiers must differ".to_string(),
            });
        }

        for (field, value) in [
            ("layout.app_folder", &layout.app_folder),
            ("paths.preferences_name", &self.paths.preferences_name),
        ] {
            if value.contains('/') || value.contains('\\') || value == ".." {
                return Err(ConfigError::ValidationError {
                    message: format!("'{}' must be a single path component", field),
                });
            }
        }

        if let Some(key) = layout
            .list_keys
            .iter()
            .find(|k| k.is_empty() || k.contains(' '))
        {
            return Err(ConfigError::ValidationError {
                message: format!("List key '{}' must be non-empty and contain no spaces", key),
            });
        }

        Ok(())
    }
}
