//! Shared fixtures for facade integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use prefbridge::{FixedLocation, Layout};
use tempfile::TempDir;

pub const HOST_ID: &str = "com.example.host";
pub const MODULE_ID: &str = "com.example.module";
pub const APP_FOLDER: &str = "PrefBridge";
pub const PREFS_NAME: &str = "settings";

/// On-disk sandbox laid out like a device: a host data directory, the
/// module's sibling directory, and external storage.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn host_data_dir(&self) -> PathBuf {
        self.dir.path().join("data").join(HOST_ID)
    }

    pub fn external_root(&self) -> PathBuf {
        self.dir.path().join("sdcard")
    }

    pub fn location(&self) -> FixedLocation {
        FixedLocation::new(self.host_data_dir(), self.external_root())
    }

    pub fn legacy_dir(&self) -> PathBuf {
        self.external_root().join(APP_FOLDER).join(".prefs")
    }

    pub fn legacy_file(&self) -> PathBuf {
        self.legacy_dir().join(PREFS_NAME)
    }

    pub fn live_file(&self) -> PathBuf {
        self.dir
            .path()
            .join("data")
            .join(MODULE_ID)
            .join("shared_prefs")
            .join(format!("{}.xml", PREFS_NAME))
    }

    /// Write a legacy snapshot from a JSON object literal.
    pub fn write_legacy(&self, json: &str) {
        fs::create_dir_all(self.legacy_dir()).unwrap();
        fs::write(self.legacy_file(), json).unwrap();
    }

    /// Write the live store with the given `<map>` body.
    pub fn write_live(&self, body: &str) {
        let path = self.live_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!(
                "<?xml version='1.0' encoding='utf-8' standalone='yes' ?>\n<map>\n{}\n</map>\n",
                body
            ),
        )
        .unwrap();
    }
}

pub fn layout(list_keys: &[&str]) -> Layout {
    Layout {
        app_folder: APP_FOLDER.to_string(),
        host_id: HOST_ID.to_string(),
        module_id: MODULE_ID.to_string(),
        list_keys: list_keys.iter().map(|k| k.to_string()).collect(),
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
