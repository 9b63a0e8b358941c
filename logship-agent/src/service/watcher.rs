//! Readiness watcher
//!
//! A one-shot, re-armable subscription to the "remote store became ready"
//! signal. Armed whenever a document lands on disk; the first delivery
//! disarms it before the caller's reaction runs.

use std::sync::Mutex;

use tracing::debug;

use crate::locking::lock;
use crate::signal::{Signal, Subscription};

pub struct ReadinessWatcher {
    signal: Signal,
    subscription: Mutex<Option<Subscription>>,
}

impl ReadinessWatcher {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            subscription: Mutex::new(None),
        }
    }

    /// Subscribes `on_ready` to the readiness signal unless already armed
    ///
    /// # Returns
    /// `true` if this call armed the watcher, `false` if it already was
    pub fn arm<F>(&self, on_ready: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut slot = lock(&self.subscription);
        if slot.is_some() {
            return false;
        }

        *slot = Some(self.signal.subscribe(on_ready));
        debug!("Watching signal '{}'", self.signal.name());
        true
    }

    /// Drops the subscription, if any
    ///
    /// # Returns
    /// `true` if the watcher was armed. When several deliveries race, only
    /// one of them observes `true`.
    pub fn disarm(&self) -> bool {
        // Drop the subscription after releasing our own lock
        let subscription = lock(&self.subscription).take();
        subscription.is_some()
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.subscription).is_some()
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }
}

impl Drop for ReadinessWatcher {
    fn drop(&mut self) {
        self.disarm();
    }
}
