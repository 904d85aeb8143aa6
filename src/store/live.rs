//! Reloadable live preference store.
//!
//! Bound once to the producer's `shared_prefs/<name>.xml` inside the
//! module's data directory. The binding never changes; `reload()` re-reads
//! the same file and swaps the parsed map in atomically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::store::xml::{parse_prefs, XmlError};
use crate::value::PrefsMap;

/// Directory inside a data directory that holds preference files.
pub const SHARED_PREFS_DIR: &str = "shared_prefs";

/// Errors that can occur when reading the live store.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("Failed to read preferences file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse preferences file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
}

/// Thread-safe live preference map bound to a single file.
///
/// Readers take a cheap `Arc` snapshot; a reload never exposes a
/// half-parsed map.
#[derive(Debug)]
pub struct LiveStore {
    path: PathBuf,
    entries: RwLock<Arc<PrefsMap>>,
}

impl LiveStore {
    /// Path of the live file for a preferences name.
    pub fn path_for(module_data_dir: &Path, name: &str) -> PathBuf {
        module_data_dir
            .join(SHARED_PREFS_DIR)
            .join(format!("{}.xml", name))
    }

    /// Bind to `path` and perform the initial read.
    ///
    /// Never fails: a missing file is an empty store, and an unreadable or
    /// malformed file is logged and also starts out empty.
    pub fn bind(path: PathBuf) -> Self {
        let store = Self {
            path,
            entries: RwLock::new(Arc::new(PrefsMap::new())),
        };
        if let Err(e) = store.reload() {
            tracing::warn!(error = %e, "Live preferences unavailable, starting empty");
        }
        store
    }

    /// Re-read the bound file.
    ///
    /// A missing file replaces the contents with an empty map. On any other
    /// failure the previous contents are kept and the error is returned.
    pub fn reload(&self) -> Result<(), LiveError> {
        let entries = read_entries(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Live preferences loaded"
        );
        *self.entries.write() = Arc::new(entries);
        Ok(())
    }

    /// Current contents.
    pub fn snapshot(&self) -> Arc<PrefsMap> {
        Arc::clone(&self.entries.read())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_entries(path: &Path) -> Result<PrefsMap, LiveError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PrefsMap::new()),
        Err(e) => {
            return Err(LiveError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    parse_prefs(&content).map_err(|e| LiveError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ConfigValue;
    use tempfile::TempDir;

    fn write_prefs(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("<map>{}</map>", body)).unwrap();
    }

    #[test]
    fn path_is_under_shared_prefs() {
        assert_eq!(
            LiveStore::path_for(Path::new("/data/data/module"), "settings"),
            PathBuf::from("/data/data/module/shared_prefs/settings.xml")
        );
    }

    #[test]
    fn bind_to_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LiveStore::bind(temp_dir.path().join("shared_prefs/settings.xml"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn reload_picks_up_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = LiveStore::path_for(temp_dir.path(), "settings");
        let store = LiveStore::bind(path.clone());
        assert!(store.snapshot().is_empty());

        write_prefs(&path, r#"<int name="x" value="7" />"#);
        store.reload().unwrap();
        assert_eq!(store.snapshot()["x"], ConfigValue::Int(7));

        fs::remove_file(&path).unwrap();
        store.reload().unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn reload_invalid_keeps_previous() {
        let temp_dir = TempDir::new().unwrap();
        let path = LiveStore::path_for(temp_dir.path(), "settings");
        write_prefs(&path, r#"<boolean name="on" value="true" />"#);
        let store = LiveStore::bind(path.clone());

        fs::write(&path, "<map><string name=\"a\">x</set>").unwrap();
        assert!(matches!(
            store.reload(),
            Err(LiveError::ParseError { .. })
        ));
        assert_eq!(store.snapshot()["on"], ConfigValue::Bool(true));
    }
}
