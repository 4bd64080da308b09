//! Capability-gated tile construction.
//!
//! The catalog is a fixed, compile-time-known table of tile kinds selected
//! dynamically by string key. Declining a key (unknown, capability absent,
//! variant excluded) is silent and expected; the caller simply omits it
//! from the live set. Only an unexpected builder failure is an error, and
//! even that skips just the one key.

use crate::queue::PanelSender;
use crate::tile::Tile;
use crate::Result;
use slate_config::PanelConfig;
use slate_events::TileKey;

/// Hardware/feature capabilities a tile kind may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CompassSensor,
    Torch,
    Nfc,
    /// More than one SIM slot present
    MultiSim,
}

/// Build variant of the surrounding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildVariant {
    Full,
    Lite,
}

/// Boolean predicates about the host device, queried once per construction
/// attempt.
pub trait CapabilityProbe: Send + Sync {
    fn has(&self, capability: Capability) -> bool;

    fn variant(&self) -> BuildVariant {
        BuildVariant::Full
    }
}

/// Everything a tile builder may need at construction time.
pub struct CreateContext<'a> {
    pub probe: &'a dyn CapabilityProbe,
    pub config: &'a PanelConfig,
    /// Sender tiles clone into background callbacks to re-enter the
    /// dispatch thread
    pub events: &'a PanelSender,
}

type BuildFn = fn(&CreateContext<'_>) -> Result<Box<dyn Tile>>;

/// One entry in the fixed catalog: key, gating, builder, and an optional
/// settings schema for configuration UI introspection.
pub struct TileSpec {
    pub key: &'static str,
    /// Capabilities that must all be present
    pub requires: &'static [Capability],
    /// Variants the kind exists in; empty means all
    pub variants: &'static [BuildVariant],
    pub build: BuildFn,
    pub settings_schema: Option<fn() -> schemars::schema::RootSchema>,
}

/// The capability-gated factory.
pub struct TileCatalog {
    specs: Vec<TileSpec>,
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCatalog {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn with_specs(specs: Vec<TileSpec>) -> Self {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.add(spec);
        }
        catalog
    }

    /// Add a kind to the catalog. A later spec for the same key replaces the
    /// earlier one.
    pub fn add(&mut self, spec: TileSpec) {
        if let Some(existing) = self.specs.iter_mut().find(|s| s.key == spec.key) {
            log::warn!("Catalog: replacing spec for '{}'", spec.key);
            *existing = spec;
        } else {
            self.specs.push(spec);
        }
    }

    /// Keys of every kind in the catalog, gated or not.
    pub fn known_keys(&self) -> Vec<TileKey> {
        self.specs.iter().map(|s| TileKey::from(s.key)).collect()
    }

    /// Settings schema for a kind, when the kind declares one.
    pub fn settings_schema(&self, key: &TileKey) -> Option<schemars::schema::RootSchema> {
        self.specs
            .iter()
            .find(|s| s.key == key.as_str())
            .and_then(|s| s.settings_schema)
            .map(|f| f())
    }

    /// Construct the tile for `key`, or decline.
    ///
    /// `Ok(None)` means declined: unknown key, a required capability is
    /// absent, or the build variant excludes the kind. `Err` means the
    /// builder itself failed unexpectedly; the caller logs it and skips the
    /// key without aborting the remaining catalog.
    pub fn create(&self, key: &TileKey, cx: &CreateContext<'_>) -> Result<Option<Box<dyn Tile>>> {
        let Some(spec) = self.specs.iter().find(|s| s.key == key.as_str()) else {
            log::debug!("Catalog: unknown key '{}', declining", key);
            return Ok(None);
        };

        if !spec.variants.is_empty() && !spec.variants.contains(&cx.probe.variant()) {
            log::debug!(
                "Catalog: '{}' excluded in {:?} variant, declining",
                key,
                cx.probe.variant()
            );
            return Ok(None);
        }

        for capability in spec.requires {
            if !cx.probe.has(*capability) {
                log::debug!("Catalog: '{}' needs {:?}, declining", key, capability);
                return Ok(None);
            }
        }

        let tile = (spec.build)(cx)?;
        log::debug!("Catalog: built '{}'", key);
        Ok(Some(tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;
    use crate::tile::{RefreshContext, TileFlags, TileRuntime};
    use slate_events::TileState;

    struct NullTile {
        rt: TileRuntime,
    }

    impl NullTile {
        fn boxed(key: &str) -> Box<dyn Tile> {
            Box::new(Self {
                rt: TileRuntime::new(TileKey::from(key), TileFlags::default()),
            })
        }
    }

    impl Tile for NullTile {
        fn key(&self) -> TileKey {
            self.rt.key()
        }
        fn flags(&self) -> TileFlags {
            self.rt.flags()
        }
        fn refresh_state(&mut self, _cx: &RefreshContext<'_>) -> Result<TileState> {
            Ok(TileState::hidden())
        }
        fn on_primary_activate(&mut self) -> Result<()> {
            Ok(())
        }
        fn set_listening(&mut self, active: bool) -> Result<()> {
            self.rt.set_listening(active);
            Ok(())
        }
        fn configuration_refresh(&mut self, _config: &PanelConfig) -> Result<()> {
            Ok(())
        }
        fn destroy(&mut self) {
            self.rt.destroy();
        }
    }

    struct FixedProbe {
        compass: bool,
        variant: BuildVariant,
    }

    impl CapabilityProbe for FixedProbe {
        fn has(&self, capability: Capability) -> bool {
            match capability {
                Capability::CompassSensor => self.compass,
                _ => true,
            }
        }
        fn variant(&self) -> BuildVariant {
            self.variant
        }
    }

    fn test_specs() -> Vec<TileSpec> {
        vec![
            TileSpec {
                key: "plain",
                requires: &[],
                variants: &[],
                build: |_| Ok(NullTile::boxed("plain")),
                settings_schema: None,
            },
            TileSpec {
                key: "compass",
                requires: &[Capability::CompassSensor],
                variants: &[],
                build: |_| Ok(NullTile::boxed("compass")),
                settings_schema: None,
            },
            TileSpec {
                key: "full_only",
                requires: &[],
                variants: &[BuildVariant::Full],
                build: |_| Ok(NullTile::boxed("full_only")),
                settings_schema: None,
            },
            TileSpec {
                key: "broken",
                requires: &[],
                variants: &[],
                build: |_| anyhow::bail!("service unavailable"),
                settings_schema: None,
            },
        ]
    }

    fn create(
        catalog: &TileCatalog,
        probe: &FixedProbe,
        key: &str,
    ) -> Result<Option<Box<dyn Tile>>> {
        let config = PanelConfig::default();
        let queue = EventQueue::new();
        let sender = queue.sender();
        let cx = CreateContext {
            probe,
            config: &config,
            events: &sender,
        };
        catalog.create(&TileKey::from(key), &cx)
    }

    #[test]
    fn builds_ungated_kind() {
        let catalog = TileCatalog::with_specs(test_specs());
        let probe = FixedProbe {
            compass: false,
            variant: BuildVariant::Full,
        };
        assert!(create(&catalog, &probe, "plain").unwrap().is_some());
    }

    #[test]
    fn declines_missing_capability_silently() {
        let catalog = TileCatalog::with_specs(test_specs());
        let probe = FixedProbe {
            compass: false,
            variant: BuildVariant::Full,
        };
        assert!(create(&catalog, &probe, "compass").unwrap().is_none());

        let probe = FixedProbe {
            compass: true,
            variant: BuildVariant::Full,
        };
        assert!(create(&catalog, &probe, "compass").unwrap().is_some());
    }

    #[test]
    fn declines_unknown_key() {
        let catalog = TileCatalog::with_specs(test_specs());
        let probe = FixedProbe {
            compass: true,
            variant: BuildVariant::Full,
        };
        assert!(create(&catalog, &probe, "nope").unwrap().is_none());
    }

    #[test]
    fn declines_excluded_variant() {
        let catalog = TileCatalog::with_specs(test_specs());
        let probe = FixedProbe {
            compass: true,
            variant: BuildVariant::Lite,
        };
        assert!(create(&catalog, &probe, "full_only").unwrap().is_none());
    }

    #[test]
    fn builder_failure_is_an_error_not_a_decline() {
        let catalog = TileCatalog::with_specs(test_specs());
        let probe = FixedProbe {
            compass: true,
            variant: BuildVariant::Full,
        };
        assert!(create(&catalog, &probe, "broken").is_err());
    }
}
