//! Live tile set and event distributor.
//!
//! Owns the registry of live tile instances keyed by identity, routes
//! host-originated lifecycle events and app-originated domain events to the
//! right instances, and isolates per-recipient failures so one broken tile
//! can never disable the panel.
//!
//! All mutation happens on the single event-dispatch thread; the interior
//! mutex exists for incidental concurrent readers (a background callback
//! checking whether its tile is still live), not for parallel dispatch.

use crate::policy;
use crate::tile::{RefreshContext, Tile};
use crate::Result;
use slate_config::PanelConfig;
use slate_events::{DomainEvent, LockState, TileEvent, TileKey, TileState};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

/// Non-keyed recipient of every domain event; used by cross-cutting concerns
/// (panel-wide layout, transport bridges) that are not tiles themselves.
pub trait BroadcastSubscriber: Send {
    fn on_domain_event(&mut self, event: &DomainEvent);
}

struct Entry {
    key: TileKey,
    instance_id: u64,
    tile: Box<dyn Tile>,
}

struct Inner {
    /// Live instances in registration order (broadcast delivery order)
    tiles: Vec<Entry>,
    /// Host-visible declarative state, last known-good per key
    states: HashMap<TileKey, TileState>,
    subscribers: Vec<Box<dyn BroadcastSubscriber>>,
    /// Latest lock snapshot, updated ahead of the visibility recomputation
    lock: LockState,
    /// Set while the reconfiguration protocol runs; dispatch is invalid then
    rebuilding: bool,
    next_instance_id: u64,
}

/// The registry / event distributor.
pub struct TileRegistry {
    inner: Mutex<Inner>,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one tile handler with failures contained to that tile: an `Err` is
/// logged, a panic is caught and logged, and either way the caller moves on
/// to the remaining recipients.
fn isolate<T>(key: &TileKey, what: &str, f: impl FnOnce() -> Result<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::error!("Registry: tile '{}' failed during {}: {:#}", key, what, e);
            None
        }
        Err(_) => {
            log::error!("Registry: tile '{}' panicked during {}", key, what);
            None
        }
    }
}

impl TileRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tiles: Vec::new(),
                states: HashMap::new(),
                subscribers: Vec::new(),
                lock: LockState::default(),
                rebuilding: false,
                next_instance_id: 1,
            }),
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("registry poisoned")
    }

    // === REGISTRATION ===

    /// Insert a tile if its key is absent. Re-registering a live key is a
    /// no-op, enforcing the at-most-one-instance invariant. Returns whether
    /// the tile was inserted.
    pub fn register(&self, tile: Box<dyn Tile>) -> bool {
        let key = tile.key();
        let mut inner = self.lock_inner();
        if inner.tiles.iter().any(|e| e.key == key) {
            log::debug!("Registry: '{}' already registered, ignoring", key);
            return false;
        }
        let instance_id = inner.next_instance_id;
        inner.next_instance_id += 1;
        log::debug!("Registry: registered '{}' (instance {})", key, instance_id);
        inner.tiles.push(Entry {
            key,
            instance_id,
            tile,
        });
        true
    }

    /// Remove a tile without destroying it (the caller takes ownership of
    /// teardown). Returns whether an entry was removed.
    pub fn unregister(&self, key: &TileKey) -> Option<Box<dyn Tile>> {
        let mut inner = self.lock_inner();
        let idx = inner.tiles.iter().position(|e| &e.key == key)?;
        let entry = inner.tiles.remove(idx);
        inner.states.remove(key);
        log::debug!("Registry: unregistered '{}'", key);
        Some(entry.tile)
    }

    /// Register a plain broadcast subscriber; delivery follows registration
    /// order.
    pub fn add_subscriber(&self, subscriber: Box<dyn BroadcastSubscriber>) {
        self.lock_inner().subscribers.push(subscriber);
    }

    // === INSPECTION ===

    pub fn len(&self) -> usize {
        self.lock_inner().tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().tiles.is_empty()
    }

    /// Number of live instances for `key`; by invariant always 0 or 1.
    pub fn count(&self, key: &TileKey) -> usize {
        self.lock_inner()
            .tiles
            .iter()
            .filter(|e| &e.key == key)
            .count()
    }

    pub fn is_live(&self, key: &TileKey) -> bool {
        self.count(key) == 1
    }

    /// Keys of live tiles in registration order.
    pub fn keys(&self) -> Vec<TileKey> {
        self.lock_inner().tiles.iter().map(|e| e.key.clone()).collect()
    }

    /// Identity of the live instance for `key`; changes across rebuilds.
    pub fn instance_id(&self, key: &TileKey) -> Option<u64> {
        self.lock_inner()
            .tiles
            .iter()
            .find(|e| &e.key == key)
            .map(|e| e.instance_id)
    }

    /// Last known-good declarative state for `key`, consumed by the host's
    /// rendering layer.
    pub fn tile_state(&self, key: &TileKey) -> Option<TileState> {
        self.lock_inner().states.get(key).cloned()
    }

    // === DISPATCH ===

    /// Route a host lifecycle event to the tile registered under `key`.
    ///
    /// Returns whether the event was handled: `false` for unknown keys
    /// (expected when a key was capability-declined) and for long/secondary
    /// activations the tile did not fully handle, letting the host fall back
    /// to its default behavior.
    pub fn dispatch_targeted(&self, key: &TileKey, event: TileEvent) -> bool {
        let mut inner = self.lock_inner();
        if inner.rebuilding {
            log::warn!("Registry: dropping {:?} for '{}' mid-rebuild", event, key);
            return false;
        }
        let Some(idx) = inner.tiles.iter().position(|e| &e.key == key) else {
            log::debug!("Registry: no live tile for '{}', dropping {:?}", key, event);
            return false;
        };

        match event {
            TileEvent::RefreshState => {
                inner.refresh_at(idx, None);
                true
            }
            TileEvent::Click => {
                let entry = &mut inner.tiles[idx];
                let clicked =
                    isolate(key, "on_primary_activate", || entry.tile.on_primary_activate())
                        .is_some();
                if clicked {
                    inner.refresh_at(idx, None);
                }
                clicked
            }
            TileEvent::LongClick => {
                let entry = &mut inner.tiles[idx];
                let handled = isolate(key, "on_long_activate", || entry.tile.on_long_activate())
                    .unwrap_or(false);
                if handled {
                    inner.refresh_at(idx, None);
                }
                handled
            }
            TileEvent::SecondaryClick => {
                let entry = &mut inner.tiles[idx];
                let handled =
                    isolate(key, "on_secondary_activate", || entry.tile.on_secondary_activate())
                        .unwrap_or(false);
                if handled {
                    inner.refresh_at(idx, None);
                }
                handled
            }
            TileEvent::ViewCreated => {
                {
                    let entry = &mut inner.tiles[idx];
                    isolate(key, "on_view_created", || entry.tile.on_view_created());
                }
                inner.refresh_at(idx, None);
                true
            }
            TileEvent::SetListening(active) => {
                let entry = &mut inner.tiles[idx];
                isolate(key, "set_listening", || entry.tile.set_listening(active));
                true
            }
            TileEvent::Destroy => {
                // Synchronous: the entry is gone before destroy() runs, so
                // no later event can reach a destroyed instance.
                let mut entry = inner.tiles.remove(idx);
                inner.states.remove(key);
                log::debug!("Registry: destroying '{}' (instance {})", key, entry.instance_id);
                isolate(key, "destroy", || {
                    entry.tile.destroy();
                    Ok(())
                });
                true
            }
        }
    }

    /// Fan a domain event out to every registered tile (registration order),
    /// then every plain broadcast subscriber. A failing recipient never
    /// interrupts delivery to the rest.
    pub fn dispatch_broadcast(&self, event: &DomainEvent) {
        let mut inner = self.lock_inner();
        if inner.rebuilding {
            log::warn!("Registry: dropping broadcast {:?} mid-rebuild", event);
            return;
        }
        for idx in 0..inner.tiles.len() {
            let key = inner.tiles[idx].key.clone();
            {
                let entry = &mut inner.tiles[idx];
                isolate(&key, "on_domain_event", || entry.tile.on_domain_event(event));
            }
            inner.refresh_at(idx, Some(event));
        }
        for subscriber in inner.subscribers.iter_mut() {
            if catch_unwind(AssertUnwindSafe(|| subscriber.on_domain_event(event))).is_err() {
                log::error!("Registry: broadcast subscriber panicked");
            }
        }
    }

    /// Apply a flag-only configuration change in place on every live
    /// instance, then recompute visibility.
    pub fn configuration_refresh_all(&self, config: &PanelConfig) {
        let mut inner = self.lock_inner();
        for idx in 0..inner.tiles.len() {
            let key = inner.tiles[idx].key.clone();
            {
                let entry = &mut inner.tiles[idx];
                isolate(&key, "configuration_refresh", || {
                    entry.tile.configuration_refresh(config)
                });
            }
            inner.refresh_at(idx, None);
        }
    }

    /// New lock snapshot: store it and recompute every tile's visibility.
    pub fn on_lock_changed(&self, lock: LockState) {
        let mut inner = self.lock_inner();
        inner.lock = lock;
        for idx in 0..inner.tiles.len() {
            inner.refresh_at(idx, None);
        }
    }

    /// Request a state refresh for every live tile.
    pub fn refresh_all(&self) {
        let mut inner = self.lock_inner();
        for idx in 0..inner.tiles.len() {
            inner.refresh_at(idx, None);
        }
    }

    // === REBUILD SUPPORT ===

    /// Destroy every live tile and clear all host-visible state. Returns the
    /// number of instances torn down.
    pub fn drain(&self) -> usize {
        let mut inner = self.lock_inner();
        let entries: Vec<Entry> = inner.tiles.drain(..).collect();
        inner.states.clear();
        let count = entries.len();
        for mut entry in entries {
            let key = entry.key.clone();
            isolate(&key, "destroy", || {
                entry.tile.destroy();
                Ok(())
            });
        }
        if count > 0 {
            log::info!("Registry: drained {} tiles", count);
        }
        count
    }

    pub(crate) fn set_rebuilding(&self, rebuilding: bool) {
        self.lock_inner().rebuilding = rebuilding;
    }
}

impl Inner {
    /// Recompute declarative state for the tile at `idx` and, on success,
    /// copy it wholesale into the host-visible container with the visibility
    /// policy applied. On failure the previous state stays intact so the
    /// panel never flashes to an empty appearance.
    fn refresh_at(&mut self, idx: usize, event: Option<&DomainEvent>) {
        let lock = self.lock;
        let entry = &mut self.tiles[idx];
        let key = entry.key.clone();
        let cx = RefreshContext { lock, event };
        let refreshed = isolate(&key, "refresh_state", || {
            let state = entry.tile.refresh_state(&cx)?;
            Ok((state, entry.tile.flags()))
        });
        if let Some((mut state, flags)) = refreshed {
            state.visible = state.visible && policy::visible(&flags, &lock);
            self.states.insert(key, state);
        }
    }
}
