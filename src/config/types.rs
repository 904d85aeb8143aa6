use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::locate::FixedLocation;
use crate::signal::file_watch::DEFAULT_DEBOUNCE_MS;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Where preference files live and which keys hold lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    /// Folder on external storage holding legacy snapshots (e.g., "PrefBridge").
    #[serde(default = "default_app_folder")]
    pub app_folder: String,
    /// Identifier of the host process, as it appears in its data directory.
    #[serde(default = "default_host_id")]
    pub host_id: String,
    /// Identifier of the module that produces the preferences.
    #[serde(default = "default_module_id")]
    pub module_id: String,
    /// Keys whose values are space-delimited lists.
    #[serde(default)]
    pub list_keys: Vec<String>,
}

/// Filesystem locations for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    /// Host data directory (default: `/data/data/<host_id>`).
    #[serde(default)]
    pub host_data_dir: Option<PathBuf>,
    /// External storage root (default: the user's home directory).
    #[serde(default)]
    pub external_storage_root: Option<PathBuf>,
    /// Logical preferences name, without extension.
    #[serde(default = "default_preferences_name")]
    pub preferences_name: String,
}

/// File watching for `prefbridge watch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_watch_enabled")]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_app_folder() -> String {
    "PrefBridge".to_string()
}

fn default_host_id() -> String {
    "com.example.host".to_string()
}

fn default_module_id() -> String {
    "com.example.module".to_string()
}

fn default_preferences_name() -> String {
    "settings".to_string()
}

fn default_watch_enabled() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            app_folder: default_app_folder(),
            host_id: default_host_id(),
            module_id: default_module_id(),
            list_keys: Vec::new(),
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            host_data_dir: None,
            external_storage_root: None,
            preferences_name: default_preferences_name(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_watch_enabled(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Location context built from the configured paths.
    ///
    /// Unset paths fall back to `/data/data/<host_id>` and the home
    /// directory respectively.
    pub fn location(&self) -> FixedLocation {
        let host_data_dir = self
            .paths
            .host_data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("/data/data").join(&self.layout.host_id));
        let external_root = self
            .paths
            .external_storage_root
            .clone()
            .or_else(dirs::home_dir);

        FixedLocation::unavailable()
            .with_host_data_dir(Some(host_data_dir))
            .with_external_storage_root(external_root)
    }
}
