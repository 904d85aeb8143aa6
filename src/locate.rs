//! Locating preference files on disk.
//!
//! The consumer runs inside a host process and can only ask for the host's
//! data directory. The module's own directory is derived by substituting
//! the host identifier with the module identifier in that path.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur when resolving preference locations.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Data directory is unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Data directory '{path}' is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },

    #[error("Host identifier '{host_id}' does not occur in data directory '{path}'")]
    HostIdNotInPath { host_id: String, path: PathBuf },
}

/// Resolves the directories the facade reads from.
pub trait LocationContext: Send + Sync {
    /// Data directory of the host process the consumer runs in.
    fn host_data_dir(&self) -> Result<PathBuf, LocateError>;

    /// Root of external storage holding legacy snapshots.
    fn external_storage_root(&self) -> Result<PathBuf, LocateError>;
}

/// Location context with fixed, pre-resolved directories.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    host_data_dir: Option<PathBuf>,
    external_storage_root: Option<PathBuf>,
}

impl FixedLocation {
    pub fn new(host_data_dir: PathBuf, external_storage_root: PathBuf) -> Self {
        Self {
            host_data_dir: Some(host_data_dir),
            external_storage_root: Some(external_storage_root),
        }
    }

    /// A context that resolves nothing.
    pub fn unavailable() -> Self {
        Self {
            host_data_dir: None,
            external_storage_root: None,
        }
    }

    pub fn with_host_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.host_data_dir = dir;
        self
    }

    pub fn with_external_storage_root(mut self, dir: Option<PathBuf>) -> Self {
        self.external_storage_root = dir;
        self
    }
}

impl LocationContext for FixedLocation {
    fn host_data_dir(&self) -> Result<PathBuf, LocateError> {
        self.host_data_dir
            .clone()
            .ok_or_else(|| LocateError::Unavailable {
                reason: "host data directory not configured".to_string(),
            })
    }

    fn external_storage_root(&self) -> Result<PathBuf, LocateError> {
        self.external_storage_root
            .clone()
            .ok_or_else(|| LocateError::Unavailable {
                reason: "external storage root not configured".to_string(),
            })
    }
}

/// Derive the module's data directory from the host's.
///
/// Every occurrence of `host_id` is replaced with `module_id`.
pub fn module_data_dir(host_dir: &Path, host_id: &str, module_id: &str) -> Result<PathBuf, LocateError> {
    let host = host_dir.to_str().ok_or_else(|| LocateError::NonUtf8Path {
        path: host_dir.to_path_buf(),
    })?;

    if !host.contains(host_id) {
        return Err(LocateError::HostIdNotInPath {
            host_id: host_id.to_string(),
            path: host_dir.to_path_buf(),
        });
    }

    Ok(PathBuf::from(host.replace(host_id, module_id)))
}
