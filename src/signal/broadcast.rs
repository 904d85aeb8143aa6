//! In-process reload broadcasts.
//!
//! A `Broadcaster` fans action identifiers out to every subscriber over a
//! `tokio::sync::broadcast` channel. Each `ActionSignal` subscription drains
//! its receiver on a dedicated thread driving a small current-thread runtime
//! and fires the callback only for its own action. Callers need no runtime.
//! Dropping the `Subscription` ends the thread and releases its receiver.

use std::thread;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;

use super::{ReloadCallback, ReloadSignal, SignalError, Subscription};

/// Action announced by producers after writing new preferences.
pub const DEFAULT_RELOAD_ACTION: &str = "prefbridge.action.UPDATE_PREF";

const CHANNEL_CAPACITY: usize = 16;

/// Sending side of the in-process broadcast.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<String>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Announce `action`. Returns how many listeners were reached.
    pub fn send(&self, action: &str) -> usize {
        self.tx.send(action.to_string()).unwrap_or(0)
    }

    /// A subscribable signal scoped to `action`.
    pub fn signal(&self, action: &str) -> ActionSignal {
        ActionSignal {
            tx: self.tx.clone(),
            action: action.to_string(),
        }
    }

    /// Number of live listener threads.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Reload signal that fires when its action is broadcast.
#[derive(Clone)]
pub struct ActionSignal {
    tx: broadcast::Sender<String>,
    action: String,
}

/// Closes the listener when the subscription is dropped.
struct ListenerGuard {
    _close: oneshot::Sender<()>,
}

impl ReloadSignal for ActionSignal {
    fn subscribe(&self, on_signal: ReloadCallback) -> Result<Subscription, SignalError> {
        let mut rx = self.tx.subscribe();
        let (close_tx, mut close_rx) = oneshot::channel::<()>();
        let action = self.action.clone();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(SignalError::Spawn)?;

        thread::Builder::new()
            .name("reload-listener".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;
                            _ = &mut close_rx => break,
                            received = rx.recv() => {
                                let fire = match received {
                                    Ok(received) => received == action,
                                    Err(RecvError::Lagged(skipped)) => {
                                        // Missed messages may have included ours.
                                        tracing::warn!(skipped, action = %action, "Reload listener lagged");
                                        true
                                    }
                                    Err(RecvError::Closed) => break,
                                };
                                if fire {
                                    on_signal();
                                }
                            }
                        }
                    }
                });
                tracing::debug!("Reload listener stopped");
            })
            .map_err(SignalError::Spawn)?;

        tracing::debug!(action = %self.action, "Subscribed to reload broadcasts");
        Ok(Subscription::new(ListenerGuard { _close: close_tx }))
    }
}
