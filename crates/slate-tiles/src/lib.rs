//! Built-in tiles.
//!
//! The conforming tile kinds shipped with the framework. Their domain logic
//! is deliberately thin; the interesting machinery (registry, policy,
//! rebuild protocol) lives in `slate_core` and these just implement the
//! contract against it.

mod battery;
mod compass;
mod ringer;
mod torch;

pub use battery::BatteryTile;
pub use compass::CompassTile;
pub use ringer::{RingerSettings, RingerTile};
pub use torch::{LoopbackTorch, TorchService, TorchTile};

use slate_core::{Capability, TileCatalog, TileSpec};

/// Catalog entries for every built-in kind. Capability-gated kinds decline
/// on hosts without the hardware; the caller just omits them.
pub fn builtin_specs() -> Vec<TileSpec> {
    vec![
        TileSpec {
            key: "battery",
            requires: &[],
            variants: &[],
            build: |cx| Ok(Box::new(BatteryTile::new(cx.config))),
            settings_schema: None,
        },
        TileSpec {
            key: "ringer_mode",
            requires: &[],
            variants: &[],
            build: |cx| Ok(Box::new(RingerTile::new(cx.config, cx.events.clone()))),
            settings_schema: Some(ringer::settings_schema),
        },
        TileSpec {
            key: "torch",
            requires: &[Capability::Torch],
            variants: &[],
            build: |cx| {
                let service = Box::new(LoopbackTorch::new(cx.events.clone()));
                Ok(Box::new(TorchTile::new(cx.config, service)))
            },
            settings_schema: None,
        },
        TileSpec {
            key: "compass",
            requires: &[Capability::CompassSensor],
            variants: &[],
            build: |cx| Ok(Box::new(CompassTile::new(cx.config))),
            settings_schema: None,
        },
    ]
}

/// A catalog preloaded with the built-in kinds.
pub fn builtin_catalog() -> TileCatalog {
    TileCatalog::with_specs(builtin_specs())
}
