//! Event signals
//!
//! A [`Signal`] is a named, payload-less event source that callbacks can
//! subscribe to. Subscribing returns a [`Subscription`] handle; dropping the
//! handle unsubscribes. The handle only holds a weak reference to the
//! signal's registry, so it never keeps a signal alive on its own.
//!
//! Signals model the external triggers the agent reacts to: the remote
//! store becoming ready, memory pressure, and the host entering background.

use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::locking::lock;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// A cloneable event source; clones share the same subscribers
#[derive(Clone)]
pub struct Signal {
    name: Arc<str>,
    registry: Arc<Mutex<Registry>>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `callback` to run on every [`notify`](Self::notify)
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));

        trace!("Subscribed #{} to signal '{}'", id, self.name);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers the signal to every live subscriber
    ///
    /// Callbacks run on the calling thread, after the registry lock has been
    /// released, so a callback may freely subscribe or unsubscribe.
    ///
    /// # Returns
    /// The number of callbacks invoked
    pub fn notify(&self) -> usize {
        let callbacks: Vec<Callback> = lock(&self.registry)
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        trace!(
            "Delivering signal '{}' to {} subscriber(s)",
            self.name,
            callbacks.len()
        );

        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Cancellation handle returned by [`Signal::subscribe`]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Unsubscribes; equivalent to dropping the handle
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

/// The host application's lifecycle notifications
#[derive(Debug, Clone)]
pub struct LifecycleEvents {
    pub memory_pressure: Signal,
    pub entering_background: Signal,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self {
            memory_pressure: Signal::new("memory-pressure"),
            entering_background: Signal::new("entering-background"),
        }
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(signal: &Signal) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = signal.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let signal = Signal::new("ready");
        let (a, _sub_a) = counter(&signal);
        let (b, _sub_b) = counter(&signal);

        assert_eq!(signal.notify(), 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let signal = Signal::new("ready");
        let (count, sub) = counter(&signal);
        assert_eq!(signal.subscriber_count(), 1);

        sub.cancel();
        assert_eq!(signal.subscriber_count(), 0);
        assert_eq!(signal.notify(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let signal = Signal::new("ready");
        let clone = signal.clone();
        let (count, _sub) = counter(&signal);

        clone.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_unsubscribe_itself() {
        let signal = Signal::new("ready");
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let s = Arc::clone(&slot);
        let sub = signal.subscribe(move || {
            lock(&s).take();
        });
        *lock(&slot) = Some(sub);

        signal.notify();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_signal_is_harmless() {
        let signal = Signal::new("ready");
        let (_count, sub) = counter(&signal);
        drop(signal);
        drop(sub);
    }
}
