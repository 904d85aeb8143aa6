//! Reload notifications.
//!
//! The producer announces "preferences changed" through some transport the
//! facade does not own. Everything here is reduced to one seam:
//! `ReloadSignal::subscribe`, which registers a callback and hands back a
//! `Subscription` that keeps the delivery alive until dropped.
//!
//! Transports:
//! - `broadcast`: in-process fan-out scoped to an action identifier.
//! - `file_watch`: filesystem watcher on the live preferences file.

pub mod broadcast;
pub mod file_watch;

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

pub use broadcast::{ActionSignal, Broadcaster, DEFAULT_RELOAD_ACTION};
pub use file_watch::FileWatchSignal;

/// Callback invoked once per delivered reload notification.
pub type ReloadCallback = Arc<dyn Fn() + Send + Sync>;

/// Errors that can occur when subscribing to a reload signal.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Failed to create file watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    #[error("Watched path has no parent directory")]
    NoParentDir,

    #[error("Failed to spawn signal listener thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Source of "configuration changed" notifications.
pub trait ReloadSignal: Send + Sync {
    fn subscribe(&self, on_signal: ReloadCallback) -> Result<Subscription, SignalError>;
}

/// Keeps a subscription's delivery machinery alive.
///
/// Dropping it stops delivery.
pub struct Subscription {
    _guard: Box<dyn Any + Send + Sync>,
}

impl Subscription {
    pub fn new<G: Any + Send + Sync>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}

/// A signal that never fires. Useful when a consumer has no transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignal;

impl ReloadSignal for NoSignal {
    fn subscribe(&self, _on_signal: ReloadCallback) -> Result<Subscription, SignalError> {
        Ok(Subscription::new(()))
    }
}
