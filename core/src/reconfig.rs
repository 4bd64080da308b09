//! The teardown-and-rebuild protocol.
//!
//! Triggered when persisted tile order, the enabled set, or layout-affecting
//! settings change. Stop-the-world with respect to the panel: dispatch is
//! refused for the duration, and the protocol either completes wholesale or
//! leaves the registry empty pending retry. It is never left half-built.

use crate::catalog::{CapabilityProbe, CreateContext, TileCatalog};
use crate::queue::PanelSender;
use crate::registry::TileRegistry;
use slate_config::ConfigStore;
use slate_events::TileKey;
use thiserror::Error;

/// Host-panel operations the coordinator drives (external collaborator).
pub trait HostPanel {
    /// Tear down the current view of the panel. The host is expected to
    /// destroy its slots; the coordinator drains whatever it left behind.
    fn teardown_panel(&mut self) -> anyhow::Result<()>;

    /// Recreate slot views for the new tile order.
    fn rebuild_panel(&mut self, order: &[TileKey]) -> anyhow::Result<()>;
}

/// Hard failure of the rebuild protocol. The registry is left empty; the
/// panel stays blank until a retry succeeds, which beats showing a set that
/// no longer matches configuration.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("host failed to tear down panel: {0:#}")]
    Teardown(anyhow::Error),

    #[error("failed to re-read panel configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("host failed to rebuild panel: {0:#}")]
    Rebuild(anyhow::Error),
}

/// What one rebuild pass did, for logging and tests.
#[derive(Debug, Default)]
pub struct RebuildReport {
    pub torn_down: usize,
    pub built: Vec<TileKey>,
    pub declined: Vec<TileKey>,
    pub failed: Vec<TileKey>,
}

/// Orchestrates full teardown/rebuild of the registry's contents.
pub struct ReconfigurationCoordinator<'a> {
    registry: &'a TileRegistry,
    catalog: &'a TileCatalog,
    store: &'a dyn ConfigStore,
}

impl<'a> ReconfigurationCoordinator<'a> {
    pub fn new(
        registry: &'a TileRegistry,
        catalog: &'a TileCatalog,
        store: &'a dyn ConfigStore,
    ) -> Self {
        Self {
            registry,
            catalog,
            store,
        }
    }

    /// Run the full protocol: teardown, config re-read, rebuild, resume.
    pub fn rebuild(
        &self,
        host: &mut dyn HostPanel,
        probe: &dyn CapabilityProbe,
        events: &PanelSender,
    ) -> Result<RebuildReport, RebuildError> {
        self.registry.set_rebuilding(true);
        let result = self.run(host, probe, events);
        self.registry.set_rebuilding(false);

        match &result {
            Ok(report) => {
                log::info!(
                    "Reconfiguration: rebuilt panel ({} built, {} declined, {} failed)",
                    report.built.len(),
                    report.declined.len(),
                    report.failed.len()
                );
                // Push initial state for the new instances
                self.registry.refresh_all();
            }
            Err(e) => {
                log::error!("Reconfiguration: rebuild failed, panel left empty: {}", e);
            }
        }
        result
    }

    fn run(
        &self,
        host: &mut dyn HostPanel,
        probe: &dyn CapabilityProbe,
        events: &PanelSender,
    ) -> Result<RebuildReport, RebuildError> {
        let mut report = RebuildReport::default();

        // 1. Host tears its view down; drain whatever it left behind so the
        //    registry is empty even if the host only half-complied.
        let teardown = host.teardown_panel();
        report.torn_down = self.registry.drain();
        teardown.map_err(RebuildError::Teardown)?;

        // 2. Re-read persisted configuration.
        let config = self.store.load().map_err(RebuildError::Config)?;
        let order = config.active_order();

        // 3. Host recreates slots, then the catalog repopulates the registry.
        if let Err(e) = host.rebuild_panel(&order) {
            self.registry.drain();
            return Err(RebuildError::Rebuild(e));
        }

        let cx = CreateContext {
            probe,
            config: &config,
            events,
        };
        for key in order {
            match self.catalog.create(&key, &cx) {
                Ok(Some(tile)) => {
                    self.registry.register(tile);
                    report.built.push(key);
                }
                Ok(None) => report.declined.push(key),
                Err(e) => {
                    log::error!("Reconfiguration: constructing '{}' failed: {:#}", key, e);
                    report.failed.push(key);
                }
            }
        }

        Ok(report)
    }
}
