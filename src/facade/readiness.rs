//! One-shot readiness gate.
//!
//! Closed at construction, opened exactly once when loading finishes.
//! Waiters block on a condition variable; once open, checks take the
//! atomic fast path and never touch the lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct ReadyGate {
    open: AtomicBool,
    lock: Mutex<bool>,
    cond: Condvar,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Open the gate and wake every waiter. Idempotent.
    pub fn open(&self) {
        let mut opened = self.lock.lock();
        *opened = true;
        self.open.store(true, Ordering::Release);
        self.cond.notify_all();
    }

    /// Block until the gate is open.
    pub fn wait(&self) {
        if self.is_open() {
            return;
        }
        let mut opened = self.lock.lock();
        while !*opened {
            self.cond.wait(&mut opened);
        }
    }

    /// Block until the gate is open or `timeout` elapses.
    ///
    /// Returns whether the gate is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_open() {
            return true;
        }
        let mut opened = self.lock.lock();
        if !*opened {
            let _ = self
                .cond
                .wait_while_for(&mut opened, |opened| !*opened, timeout);
        }
        *opened
    }
}
