//! Legacy preference snapshot.
//!
//! Older producers serialized the whole preference map into a single file
//! under `<external storage>/<app folder>/.prefs/<name>`. The snapshot is
//! read once and never refreshed; once the live store takes over, the
//! directory is removed.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::value::{ConfigValue, PrefsMap};

/// Name of the hidden directory holding legacy snapshots.
pub const LEGACY_DIR_NAME: &str = ".prefs";

/// Errors that can occur when reading a legacy snapshot.
#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("Failed to read legacy preferences '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode legacy preferences '{path}': {source}")]
    DecodeError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable key/value snapshot loaded from a legacy file.
#[derive(Debug)]
pub struct LegacySnapshot {
    path: PathBuf,
    entries: Arc<PrefsMap>,
}

impl LegacySnapshot {
    /// Directory holding legacy snapshots for an app folder.
    pub fn dir(external_root: &Path, app_folder: &str) -> PathBuf {
        external_root.join(app_folder).join(LEGACY_DIR_NAME)
    }

    /// Path of the snapshot for a preferences name.
    pub fn path_for(external_root: &Path, app_folder: &str, name: &str) -> PathBuf {
        Self::dir(external_root, app_folder).join(name)
    }

    /// Load the snapshot at `path`.
    ///
    /// - Returns `Ok(None)` when the file does not exist.
    /// - `null` entries are dropped.
    /// - Any other read or decode failure is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, LegacyError> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LegacyError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let raw: HashMap<String, Option<ConfigValue>> =
            serde_json::from_slice(&content).map_err(|e| LegacyError::DecodeError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let total = raw.len();
        let entries: PrefsMap = raw
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();

        if entries.len() != total {
            tracing::debug!(
                path = %path.display(),
                dropped = total - entries.len(),
                "Dropped null legacy entries"
            );
        }

        Ok(Some(Self {
            path: path.to_path_buf(),
            entries: Arc::new(entries),
        }))
    }

    /// Shared handle to the snapshot contents.
    pub fn entries(&self) -> Arc<PrefsMap> {
        Arc::clone(&self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove the legacy directory and everything under it.
///
/// A directory that is already gone counts as success.
pub fn remove_legacy_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths_follow_external_layout() {
        let root = Path::new("/sdcard");
        assert_eq!(
            LegacySnapshot::path_for(root, "AppFolder", "settings"),
            PathBuf::from("/sdcard/AppFolder/.prefs/settings")
        );
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = LegacySnapshot::load(&temp_dir.path().join("absent")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn loads_values_and_drops_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings");
        fs::write(&path, r#"{"x": 5, "name": "bob", "gone": null}"#).unwrap();

        let snapshot = LegacySnapshot::load(&path).unwrap().unwrap();
        let entries = snapshot.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["x"], ConfigValue::Int(5));
        assert_eq!(snapshot.path(), path.as_path());
    }

    #[test]
    fn malformed_file_is_a_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings");
        fs::write(&path, b"\xac\xed\x00\x05garbage").unwrap();

        match LegacySnapshot::load(&path) {
            Err(LegacyError::DecodeError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected DecodeError, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_integer_is_a_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings");
        fs::write(&path, r#"{"x": 5, "big": 9223372036854775808}"#).unwrap();

        assert!(matches!(
            LegacySnapshot::load(&path),
            Err(LegacyError::DecodeError { .. })
        ));
    }

    #[test]
    fn remove_tolerates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("App").join(LEGACY_DIR_NAME);
        remove_legacy_dir(&dir).unwrap();

        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("settings"), "{}").unwrap();
        remove_legacy_dir(&dir).unwrap();
        assert!(!dir.exists());
    }
}
