//! Lifecycle hooks
//!
//! Subscribes to the host's memory-pressure and entering-background
//! notifications for as long as the hooks value lives.

use std::sync::Arc;

use crate::signal::{LifecycleEvents, Subscription};

/// Which lifecycle notification fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    MemoryPressure,
    EnteringBackground,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::MemoryPressure => write!(f, "memory pressure"),
            LifecycleEvent::EnteringBackground => write!(f, "entering background"),
        }
    }
}

/// Live subscriptions to both lifecycle signals; dropping unsubscribes
pub struct LifecycleHooks {
    _memory_pressure: Subscription,
    _entering_background: Subscription,
}

impl LifecycleHooks {
    /// Runs `on_event` synchronously on the notifying thread for each delivery
    pub fn install<F>(events: &LifecycleEvents, on_event: F) -> Self
    where
        F: Fn(LifecycleEvent) + Send + Sync + 'static,
    {
        let on_event = Arc::new(on_event);

        let handler = Arc::clone(&on_event);
        let memory_pressure = events
            .memory_pressure
            .subscribe(move || handler(LifecycleEvent::MemoryPressure));

        let handler = on_event;
        let entering_background = events
            .entering_background
            .subscribe(move || handler(LifecycleEvent::EnteringBackground));

        Self {
            _memory_pressure: memory_pressure,
            _entering_background: entering_background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_both_signals_are_forwarded() {
        let events = LifecycleEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        let _hooks = LifecycleHooks::install(&events, move |event| {
            s.lock().unwrap().push(event);
        });

        events.memory_pressure.notify();
        events.entering_background.notify();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                LifecycleEvent::MemoryPressure,
                LifecycleEvent::EnteringBackground
            ]
        );
    }

    #[test]
    fn test_dropping_hooks_unsubscribes() {
        let events = LifecycleEvents::new();
        let hooks = LifecycleHooks::install(&events, |_| {});
        assert_eq!(events.memory_pressure.subscriber_count(), 1);

        drop(hooks);
        assert_eq!(events.memory_pressure.subscriber_count(), 0);
        assert_eq!(events.entering_background.subscriber_count(), 0);
    }
}
