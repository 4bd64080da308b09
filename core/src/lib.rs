//! Slate core: the tile extension framework.
//!
//! A host control-surface panel owns a fixed grid of tile slots and issues
//! lifecycle events; this crate owns everything between those events and the
//! pluggable tiles that answer them: the capability contract, the
//! lock-screen-aware visibility policy, the registry/event distributor, the
//! capability-gated catalog, and the teardown-and-rebuild protocol for live
//! reconfiguration.

pub mod tile;
pub use tile::{Phase, RefreshContext, Tile, TileFlags, TileRuntime};

pub mod policy;

pub mod lock;
pub use lock::{LockMonitor, LockSource};

pub mod registry;
pub use registry::{BroadcastSubscriber, TileRegistry};

pub mod catalog;
pub use catalog::{BuildVariant, Capability, CapabilityProbe, CreateContext, TileCatalog, TileSpec};

pub mod reconfig;
pub use reconfig::{HostPanel, RebuildError, RebuildReport, ReconfigurationCoordinator};

pub mod queue;
pub use queue::{EventQueue, PanelEvent, PanelSender};

pub mod context;
pub use context::PanelContext;

// Re-export the value types tiles and hosts exchange
pub use slate_config::{ConfigStore, MemoryStore, PanelConfig, TomlStore};
pub use slate_events::{
    ConfigChange, DomainEvent, IconRef, LockState, TileEvent, TileKey, TileState,
};

pub type Result<T> = std::result::Result<T, anyhow::Error>;
