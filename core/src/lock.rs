//! Lock-state integration glue.
//!
//! The keyguard monitor itself is an external collaborator; the core only
//! consumes a stream of immutable [`LockState`] snapshots. [`LockMonitor`]
//! holds the latest snapshot for incidental concurrent readers and fans each
//! transition out to registered subscribers.

use slate_events::LockState;
use std::sync::{Mutex, RwLock};

/// External source of lock-state transitions (keyguard monitor boundary).
pub trait LockSource {
    /// Register a callback invoked with a fresh snapshot on every keyguard
    /// transition. Callbacks may fire from the source's own thread; anything
    /// touching panel state must re-enter the dispatch thread through the
    /// event queue.
    fn subscribe(&mut self, on_change: Box<dyn Fn(LockState) + Send>);
}

type Subscriber = Box<dyn Fn(LockState) + Send>;

/// Latest-snapshot cell plus subscriber fan-out.
pub struct LockMonitor {
    current: RwLock<LockState>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Default for LockMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LockMonitor {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(LockState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// The latest snapshot. Safe from any thread.
    pub fn current(&self) -> LockState {
        *self.current.read().expect("lock monitor poisoned")
    }

    /// Register a subscriber for future transitions.
    pub fn subscribe(&self, on_change: Subscriber) {
        self.subscribers
            .lock()
            .expect("lock monitor poisoned")
            .push(on_change);
    }

    /// Replace the snapshot wholesale and notify subscribers.
    ///
    /// Called by the external source adapter on every keyguard transition;
    /// unchanged snapshots are dropped without notifying.
    pub fn feed(&self, next: LockState) {
        {
            let mut current = self.current.write().expect("lock monitor poisoned");
            if *current == next {
                return;
            }
            *current = next;
        }
        log::debug!(
            "LockMonitor: showing={} secured={} locked={} trust_managed={}",
            next.showing,
            next.secured,
            next.locked,
            next.trust_managed
        );
        let subscribers = self.subscribers.lock().expect("lock monitor poisoned");
        for subscriber in subscribers.iter() {
            subscriber(next);
        }
    }
}
