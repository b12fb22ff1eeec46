//! # Readiness Barrier
//!
//! Purpose: Let any number of tasks wait for a value that is published
//! exactly once, then read it without synchronization.
//!
//! ## Design Principles
//! 1. **One-Shot**: `publish` succeeds once; the value never changes after.
//! 2. **Lock-Free Fast Path**: Once published, `wait` is a `OnceLock` read.
//! 3. **Broadcast Wakeup**: Waiters park on a `watch` channel and all wake
//!    together when the value lands; late arrivals never park.
//!
//! `publish` stores the value before flipping the signal, so any waiter
//! woken by the signal finds the value set.

use std::future;
use std::sync::OnceLock;

use tokio::sync::watch;

/// One-shot barrier guarding a lazily published value.
#[derive(Debug)]
pub struct ReadinessBarrier<T> {
    value: OnceLock<T>,
    signal: watch::Sender<bool>,
}

impl<T> Default for ReadinessBarrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadinessBarrier<T> {
    /// Creates an empty, not-ready barrier.
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        ReadinessBarrier {
            value: OnceLock::new(),
            signal,
        }
    }

    /// Returns true once a value has been published.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.value.get().is_some()
    }

    /// Non-blocking peek at the published value.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Publishes the value and releases every waiter.
    ///
    /// # Errors
    /// Hands the value back if the barrier was already published.
    pub fn publish(&self, value: T) -> Result<(), T> {
        self.value.set(value)?;
        self.signal.send_replace(true);
        Ok(())
    }

    /// Waits until the value is published and returns it.
    pub async fn wait(&self) -> &T {
        if let Some(value) = self.value.get() {
            return value;
        }

        // Subscribe before re-checking so a publish in between is not lost.
        let mut signal = self.signal.subscribe();
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            if signal.changed().await.is_err() {
                // The sender lives in `self`; it cannot close while borrowed.
                future::pending::<()>().await;
            }
        }
    }
}
