//! Reload signal driven by filesystem changes.
//!
//! Watches the directory containing the live preferences file and fires
//! once per burst of changes to that file, after a debounce delay.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{ReloadCallback, ReloadSignal, SignalError, Subscription};

/// Default debounce delay in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Reload signal that watches a single file.
#[derive(Debug, Clone)]
pub struct FileWatchSignal {
    path: PathBuf,
    debounce: Duration,
}

impl FileWatchSignal {
    /// Watch `path` with the default debounce delay.
    pub fn new(path: PathBuf) -> Self {
        Self::with_debounce(path, Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    pub fn with_debounce(path: PathBuf, debounce: Duration) -> Self {
        Self { path, debounce }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Keeps the OS watcher alive; dropping it disconnects the debounce thread.
struct WatchGuard {
    _watcher: RecommendedWatcher,
}

impl ReloadSignal for FileWatchSignal {
    /// Start watching the file.
    ///
    /// # Errors
    /// Returns error if the watcher cannot be initialized, the path has no
    /// parent, or the parent directory cannot be watched.
    fn subscribe(&self, on_signal: ReloadCallback) -> Result<Subscription, SignalError> {
        let watch_dir = self.path.parent().ok_or(SignalError::NoParentDir)?;
        let file_name = self
            .path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();

        let (raw_tx, raw_rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    let _ = raw_tx.send(event);
                }
            },
            notify::Config::default(),
        )?;

        // Watch the parent directory so replace-by-rename writes are seen
        watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

        let debounce = self.debounce;
        thread::Builder::new()
            .name("prefs-file-watch".to_string())
            .spawn(move || debounce_loop(raw_rx, file_name, debounce, on_signal))
            .map_err(SignalError::Spawn)?;

        tracing::info!(path = %self.path.display(), "Watching preferences file");
        Ok(Subscription::new(WatchGuard { _watcher: watcher }))
    }
}

/// Groups rapid file events and fires once `debounce` after the last one.
fn debounce_loop(
    rx: mpsc::Receiver<Event>,
    file_name: OsString,
    debounce: Duration,
    on_signal: ReloadCallback,
) {
    let mut pending: Option<Instant> = None;

    loop {
        let timeout = match pending {
            Some(last) => debounce.saturating_sub(last.elapsed()),
            None => Duration::from_secs(60),
        };

        match rx.recv_timeout(timeout) {
            Ok(event) => {
                if is_prefs_event(&event, &file_name) {
                    pending = Some(Instant::now());
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(last) = pending {
                    if last.elapsed() >= debounce {
                        tracing::debug!("Preferences file changed");
                        on_signal();
                        pending = None;
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Whether a notify event touches the watched file.
fn is_prefs_event(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    );

    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().map(|name| name == file_name).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn filters_events_by_file_name() {
        let name = OsString::from("settings.xml");
        let hit = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/data/shared_prefs/settings.xml"));
        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/data/shared_prefs/other.xml"));
        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/data/shared_prefs/settings.xml"));

        assert!(is_prefs_event(&hit, &name));
        assert!(!is_prefs_event(&other, &name));
        assert!(!is_prefs_event(&access, &name));
    }

    #[test]
    fn missing_directory_fails_to_subscribe() {
        let temp_dir = TempDir::new().unwrap();
        let signal = FileWatchSignal::new(temp_dir.path().join("absent/settings.xml"));
        assert!(signal.subscribe(Arc::new(|| {})).is_err());
    }

    #[test]
    fn fires_after_file_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.xml");
        let signal = FileWatchSignal::with_debounce(path.clone(), Duration::from_millis(20));
        assert_eq!(signal.path(), path.as_path());

        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let _sub = signal
            .subscribe(Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        fs::write(&path, "<map />").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }
}
