//! Read-only preference facade.
//!
//! # Data Flow
//! ```text
//! load():
//!     legacy snapshot (external storage, optional)
//!     → live store bound to <module data>/shared_prefs/<name>.xml
//!     → reload signal subscription
//!     → [always] list cache rebuild + readiness gate opened
//!
//! reads:
//!     wait on gate → authority? Legacy → snapshot
//!                               Live   → live store
//!     get_string_list → list cache
//!
//! reload signal:
//!     live.reload() → list cache rebuilt from live
//!     → authority Legacy → Live → background removal of legacy dir
//! ```

pub mod authority;
pub mod readiness;

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::Layout;
use crate::error::PrefsError;
use crate::locate::{module_data_dir, LocationContext};
use crate::signal::{ReloadSignal, Subscription};
use crate::store::legacy::remove_legacy_dir;
use crate::store::{LegacySnapshot, LiveStore, StringListCache};
use crate::value::{coerce_or, FromConfigValue, PrefsMap};

pub use authority::{Authority, SourceKind};
pub use readiness::ReadyGate;

/// Placeholder for an editor that can never be obtained.
#[derive(Debug)]
pub enum Editor {}

/// Callback type accepted (and always rejected) by listener registration.
pub type ChangeListener = Arc<dyn Fn(&str) + Send + Sync>;

/// What `load()` managed to set up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// A legacy snapshot was found and is authoritative.
    pub legacy_loaded: bool,
    /// Path the live store is bound to, if the data directory resolved.
    pub live_path: Option<PathBuf>,
    /// The reload signal subscription is active.
    pub subscribed: bool,
}

/// Read-only facade over the legacy and live preference sources.
///
/// Cheap to clone; all clones share state. Reads block until `load()` has
/// finished, whether it succeeded or not.
#[derive(Clone)]
pub struct PreferenceFacade {
    inner: Arc<Inner>,
}

struct Inner {
    layout: Layout,
    gate: ReadyGate,
    load_started: AtomicBool,
    authority: RwLock<Authority>,
    live: OnceLock<LiveStore>,
    legacy_dir: OnceLock<PathBuf>,
    lists: StringListCache,
    reload_lock: Mutex<()>,
    reloads: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
    cleanups: Mutex<Vec<JoinHandle<()>>>,
}

impl PreferenceFacade {
    pub fn new(layout: Layout) -> Self {
        let lists = StringListCache::new(layout.list_keys.clone());
        Self {
            inner: Arc::new(Inner {
                layout,
                gate: ReadyGate::new(),
                load_started: AtomicBool::new(false),
                authority: RwLock::new(Authority::Live),
                live: OnceLock::new(),
                legacy_dir: OnceLock::new(),
                lists,
                reload_lock: Mutex::new(()),
                reloads: AtomicU64::new(0),
                subscription: Mutex::new(None),
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.inner.layout
    }

    /// Load both sources and subscribe to reloads.
    ///
    /// Every step is best-effort; failures are logged and leave the
    /// corresponding source unavailable. Whatever happens, the list cache
    /// is rebuilt and the facade becomes ready before this returns or
    /// unwinds.
    ///
    /// # Errors
    /// Returns `PrefsError::AlreadyLoaded` on any call after the first.
    pub fn load(
        &self,
        ctx: &dyn LocationContext,
        signal: &dyn ReloadSignal,
        name: &str,
    ) -> Result<LoadOutcome, PrefsError> {
        if self.inner.load_started.swap(true, Ordering::SeqCst) {
            return Err(PrefsError::AlreadyLoaded);
        }

        let inner = &self.inner;
        scopeguard::defer! {
            {
                // A reload delivered during load may already have retired
                // legacy. Serialize with it so stale lists never win.
                let _reload = inner.reload_lock.lock();
                inner.rebuild_lists_from_authority();
            }
            inner.gate.open();
            tracing::debug!(source = ?inner.authority.read().kind(), "Preferences ready");
        }

        let mut outcome = LoadOutcome::default();

        if let Some(snapshot) = inner.load_legacy(ctx, name) {
            tracing::info!(
                path = %snapshot.path().display(),
                entries = snapshot.entries().len(),
                "Legacy preferences loaded"
            );
            *inner.authority.write() = Authority::initial(Some(snapshot));
            outcome.legacy_loaded = true;
        }

        outcome.live_path = inner.bind_live(ctx, name);

        let weak = Arc::downgrade(&self.inner);
        match signal.subscribe(Arc::new(move || on_signal(&weak))) {
            Ok(subscription) => {
                *inner.subscription.lock() = Some(subscription);
                outcome.subscribed = true;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to subscribe to preference reloads"),
        }

        Ok(outcome)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Wait for loading to finish, up to `timeout`. Returns readiness.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        self.inner.gate.wait_timeout(timeout)
    }

    /// Which source currently answers reads.
    pub fn source(&self) -> SourceKind {
        self.inner.gate.wait();
        self.inner.authority.read().kind()
    }

    /// Number of reload signals handled so far.
    pub fn reload_count(&self) -> u64 {
        self.inner.reloads.load(Ordering::SeqCst)
    }

    /// Handle a reload signal synchronously, as if the producer had
    /// broadcast one.
    pub fn reload(&self) {
        self.inner.handle_reload();
    }

    /// Join any outstanding background removals of legacy data.
    pub fn wait_for_cleanup(&self) {
        let handles: Vec<_> = self.inner.cleanups.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Legacy cleanup thread panicked");
            }
        }
    }

    /// Read `key` as `T`, or `default` if absent or of another type.
    pub fn get<T: FromConfigValue>(&self, key: &str, default: T) -> T {
        match self.inner.authoritative() {
            Some(map) => coerce_or(&map, key, default),
            None => default,
        }
    }

    /// Read `key` as `T`, or `None` if absent or of another type.
    pub fn get_opt<T: FromConfigValue>(&self, key: &str) -> Option<T> {
        self.inner
            .authoritative()
            .and_then(|map| map.get(key).and_then(T::from_value))
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key, default)
    }

    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        self.get(key, default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get(key, default)
    }

    pub fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.get(key, default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key, default.to_string())
    }

    pub fn get_string_set(&self, key: &str, default: BTreeSet<String>) -> BTreeSet<String> {
        self.get(key, default)
    }

    /// Read a set into a `HashSet`.
    pub fn get_string_hash_set(&self, key: &str, default: HashSet<String>) -> HashSet<String> {
        self.get(key, default)
    }

    /// Cached token list for a configured list key.
    ///
    /// A key holding an empty string yields an empty list; only a key with
    /// no string value (or one outside the list-key set) yields `default`.
    pub fn get_string_list(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.cached_list(key).unwrap_or(default)
    }

    /// Cached token list for `key`, or `None` if nothing is cached.
    pub fn cached_list(&self, key: &str) -> Option<Vec<String>> {
        self.inner.gate.wait();
        self.inner.lists.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .authoritative()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }

    /// Entire authoritative map, or `None` when no source is available.
    pub fn get_all(&self) -> Option<Arc<PrefsMap>> {
        self.inner.authoritative()
    }

    /// Always fails; the facade is read-only.
    pub fn edit(&self) -> Result<Editor, PrefsError> {
        Err(PrefsError::Unsupported { operation: "edit" })
    }

    /// Always fails; the facade is read-only.
    pub fn register_change_listener(&self, _listener: ChangeListener) -> Result<(), PrefsError> {
        Err(PrefsError::Unsupported {
            operation: "register_change_listener",
        })
    }

    /// Always fails; the facade is read-only.
    pub fn unregister_change_listener(&self, _listener: ChangeListener) -> Result<(), PrefsError> {
        Err(PrefsError::Unsupported {
            operation: "unregister_change_listener",
        })
    }
}

impl std::fmt::Debug for PreferenceFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceFacade")
            .field("ready", &self.inner.gate.is_open())
            .field("live", &self.inner.live.get().map(|l| l.path()))
            .field("reloads", &self.reload_count())
            .finish()
    }
}

fn on_signal(inner: &Weak<Inner>) {
    if let Some(inner) = inner.upgrade() {
        inner.handle_reload();
    }
}

impl Inner {
    fn load_legacy(&self, ctx: &dyn LocationContext, name: &str) -> Option<LegacySnapshot> {
        let root = match ctx.external_storage_root() {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!(error = %e, "No external storage, skipping legacy preferences");
                return None;
            }
        };

        let _ = self
            .legacy_dir
            .set(LegacySnapshot::dir(&root, &self.layout.app_folder));

        let path = LegacySnapshot::path_for(&root, &self.layout.app_folder, name);
        match LegacySnapshot::load(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable legacy preferences");
                None
            }
        }
    }

    fn bind_live(&self, ctx: &dyn LocationContext, name: &str) -> Option<PathBuf> {
        let module_dir = ctx.host_data_dir().and_then(|host_dir| {
            module_data_dir(&host_dir, &self.layout.host_id, &self.layout.module_id)
        });

        match module_dir {
            Ok(dir) => {
                let path = LiveStore::path_for(&dir, name);
                let live = self.live.get_or_init(|| LiveStore::bind(path));
                Some(live.path().to_path_buf())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Live preferences unavailable");
                None
            }
        }
    }

    /// Block until ready, then snapshot the authoritative map.
    fn authoritative(&self) -> Option<Arc<PrefsMap>> {
        self.gate.wait();
        self.current_entries()
    }

    fn current_entries(&self) -> Option<Arc<PrefsMap>> {
        match &*self.authority.read() {
            Authority::Legacy(snapshot) => Some(snapshot.entries()),
            Authority::Live => self.live.get().map(LiveStore::snapshot),
        }
    }

    fn rebuild_lists_from_authority(&self) {
        let entries = self.current_entries().unwrap_or_default();
        self.lists.rebuild(&entries);
    }

    fn handle_reload(&self) {
        let _guard = self.reload_lock.lock();

        let live_entries = match self.live.get() {
            Some(live) => {
                if let Err(e) = live.reload() {
                    tracing::warn!(error = %e, "Reload failed, keeping previous live preferences");
                }
                live.snapshot()
            }
            None => Arc::default(),
        };

        // Lists must reflect the live data before legacy stops answering.
        self.lists.rebuild(&live_entries);

        if let Some(retired) = self.authority.write().retire_legacy() {
            tracing::info!(
                path = %retired.path().display(),
                "Legacy preferences retired, live store is authoritative"
            );
        }

        self.spawn_legacy_cleanup();
        let count = self.reloads.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(reloads = count, entries = live_entries.len(), "Preferences reloaded");
    }

    fn spawn_legacy_cleanup(&self) {
        let Some(dir) = self.legacy_dir.get().cloned() else {
            return;
        };

        let spawned = thread::Builder::new()
            .name("legacy-cleanup".to_string())
            .spawn(move || {
                if let Err(e) = remove_legacy_dir(&dir) {
                    tracing::warn!(path = %dir.display(), error = %e, "Failed to remove legacy preferences");
                }
            });

        match spawned {
            Ok(handle) => {
                let mut cleanups = self.cleanups.lock();
                cleanups.retain(|h| !h.is_finished());
                cleanups.push(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to spawn legacy cleanup"),
        }
    }
}
