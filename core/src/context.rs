//! The explicitly constructed panel context.
//!
//! Owns the lock monitor, catalog, registry, configuration store, and event
//! queue, and is passed by reference to whatever needs them: single
//! instance per process without hidden global state. Its dispatch methods
//! are the only entry points the host and the broadcast transport use.

use crate::catalog::{CapabilityProbe, TileCatalog};
use crate::lock::{LockMonitor, LockSource};
use crate::queue::{EventQueue, PanelEvent, PanelSender};
use crate::reconfig::{HostPanel, RebuildError, RebuildReport, ReconfigurationCoordinator};
use crate::registry::TileRegistry;
use slate_config::ConfigStore;
use slate_events::{ConfigChange, DomainEvent, TileEvent, TileKey};
use std::sync::Arc;

pub struct PanelContext {
    registry: Arc<TileRegistry>,
    catalog: TileCatalog,
    lock: Arc<LockMonitor>,
    store: Box<dyn ConfigStore>,
    probe: Box<dyn CapabilityProbe>,
    queue: EventQueue,
}

impl PanelContext {
    pub fn new(
        catalog: TileCatalog,
        store: Box<dyn ConfigStore>,
        probe: Box<dyn CapabilityProbe>,
    ) -> Self {
        let queue = EventQueue::new();
        let lock = Arc::new(LockMonitor::new());

        // Keyguard transitions re-enter the dispatch thread as queue events
        let sender = queue.sender();
        lock.subscribe(Box::new(move |state| {
            sender.post(PanelEvent::LockChanged(state));
        }));

        Self {
            registry: Arc::new(TileRegistry::new()),
            catalog,
            lock,
            store,
            probe,
            queue,
        }
    }

    // === ACCESS ===

    pub fn registry(&self) -> &Arc<TileRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn lock_monitor(&self) -> &Arc<LockMonitor> {
        &self.lock
    }

    pub fn sender(&self) -> PanelSender {
        self.queue.sender()
    }

    /// Wire an external keyguard source into the monitor.
    pub fn attach_lock_source(&self, source: &mut dyn LockSource) {
        let monitor = Arc::clone(&self.lock);
        source.subscribe(Box::new(move |state| monitor.feed(state)));
    }

    // === DISPATCH ENTRY POINTS ===

    /// Route a host lifecycle event to one tile. Returns whether it was
    /// handled (see [`TileRegistry::dispatch_targeted`]).
    pub fn dispatch_targeted(&self, key: &TileKey, event: TileEvent) -> bool {
        self.registry.dispatch_targeted(key, event)
    }

    /// Fan a domain event out to every tile and broadcast subscriber.
    pub fn dispatch_broadcast(&self, event: &DomainEvent) {
        self.registry.dispatch_broadcast(event);
    }

    /// Apply a configuration change: the rebuild protocol for order/
    /// enablement/layout changes, an in-place flag refresh otherwise.
    pub fn dispatch_config_change(
        &self,
        change: &ConfigChange,
        host: &mut dyn HostPanel,
    ) -> Result<(), RebuildError> {
        if change.requires_rebuild() {
            log::info!("Context: {:?} requires a full rebuild", change);
            self.rebuild(host)?;
        } else {
            let config = self.store.load().map_err(RebuildError::Config)?;
            self.registry.configuration_refresh_all(&config);
        }
        Ok(())
    }

    // === REBUILD ===

    /// Initial population and every later rebuild share one protocol.
    pub fn populate(&self, host: &mut dyn HostPanel) -> Result<RebuildReport, RebuildError> {
        self.rebuild(host)
    }

    fn rebuild(&self, host: &mut dyn HostPanel) -> Result<RebuildReport, RebuildError> {
        let coordinator =
            ReconfigurationCoordinator::new(&self.registry, &self.catalog, self.store.as_ref());
        let sender = self.queue.sender();
        coordinator.rebuild(host, self.probe.as_ref(), &sender)
    }

    // === EVENT LOOP ===

    /// Drain the queue on the dispatch thread, routing each pending event.
    pub fn pump(&self, host: &mut dyn HostPanel) -> Result<(), RebuildError> {
        for event in self.queue.drain() {
            match event {
                PanelEvent::Targeted { key, event } => {
                    self.registry.dispatch_targeted(&key, event);
                }
                PanelEvent::Broadcast(event) => self.registry.dispatch_broadcast(&event),
                PanelEvent::ConfigChanged(change) => {
                    self.dispatch_config_change(&change, host)?;
                }
                PanelEvent::LockChanged(lock) => self.registry.on_lock_changed(lock),
            }
        }
        Ok(())
    }
}
