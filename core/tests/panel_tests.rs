//! End-to-end scenarios against the public API: capability-declined
//! construction, lock transitions, full reconfiguration, and listening
//! idempotence.

use slate_core::{
    BuildVariant, Capability, CapabilityProbe, ConfigChange, HostPanel, LockState, MemoryStore,
    PanelConfig, PanelContext, RefreshContext, Tile, TileCatalog, TileEvent, TileKey, TileRuntime,
    TileSpec, TileState,
};
use slate_core::Result;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts real resource acquisitions so listening idempotence is observable.
#[derive(Default, Clone)]
struct Resources {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

struct ProbeTile {
    rt: TileRuntime,
    resources: Resources,
}

impl ProbeTile {
    fn build(key: &str, config: &PanelConfig, resources: Resources) -> Box<dyn Tile> {
        Box::new(Self {
            rt: TileRuntime::from_config(TileKey::from(key), config),
            resources,
        })
    }
}

impl Tile for ProbeTile {
    fn key(&self) -> TileKey {
        self.rt.key()
    }

    fn flags(&self) -> slate_core::TileFlags {
        self.rt.flags()
    }

    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState> {
        Ok(TileState {
            visible: self.rt.effective_visibility(&cx.lock),
            label: self.rt.key().to_string(),
            ..TileState::hidden()
        })
    }

    fn on_primary_activate(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_listening(&mut self, active: bool) -> Result<()> {
        if self.rt.set_listening(active) {
            if active {
                self.resources.acquired.fetch_add(1, Ordering::SeqCst);
            } else {
                self.resources.released.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    fn configuration_refresh(&mut self, config: &PanelConfig) -> Result<()> {
        self.rt.refresh_flags(config);
        Ok(())
    }

    fn destroy(&mut self) {
        let was_listening = self.rt.is_listening();
        if self.rt.destroy() && was_listening {
            self.resources.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct NoopHost;

impl HostPanel for NoopHost {
    fn teardown_panel(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
    fn rebuild_panel(&mut self, _order: &[TileKey]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Declines a fixed capability, grants everything else.
struct DenyProbe(Option<Capability>);

impl CapabilityProbe for DenyProbe {
    fn has(&self, capability: Capability) -> bool {
        self.0 != Some(capability)
    }
    fn variant(&self) -> BuildVariant {
        BuildVariant::Full
    }
}

thread_local! {
    static SHARED_RESOURCES: Resources = Resources::default();
}

fn shared_resources() -> Resources {
    SHARED_RESOURCES.with(|r| r.clone())
}

fn catalog() -> TileCatalog {
    let mut catalog = TileCatalog::new();
    for spec in [
        TileSpec {
            key: "a",
            requires: &[],
            variants: &[],
            build: |cx| Ok(ProbeTile::build("a", cx.config, shared_resources())),
            settings_schema: None,
        },
        TileSpec {
            key: "b",
            requires: &[],
            variants: &[],
            build: |cx| Ok(ProbeTile::build("b", cx.config, shared_resources())),
            settings_schema: None,
        },
        TileSpec {
            key: "c",
            requires: &[Capability::CompassSensor],
            variants: &[],
            build: |cx| Ok(ProbeTile::build("c", cx.config, shared_resources())),
            settings_schema: None,
        },
        TileSpec {
            key: "d",
            requires: &[],
            variants: &[],
            build: |cx| Ok(ProbeTile::build("d", cx.config, shared_resources())),
            settings_schema: None,
        },
        TileSpec {
            key: "e",
            requires: &[],
            variants: &[],
            build: |cx| Ok(ProbeTile::build("e", cx.config, shared_resources())),
            settings_schema: None,
        },
    ] {
        catalog.add(spec);
    }
    catalog
}

fn config(order: &[&str]) -> PanelConfig {
    PanelConfig {
        tile_order: order.iter().map(|k| TileKey::from(*k)).collect(),
        enabled: order.iter().map(|k| TileKey::from(*k)).collect::<BTreeSet<_>>(),
        ..Default::default()
    }
}

#[test]
fn declined_capability_omits_key_from_live_set() {
    let ctx = PanelContext::new(
        catalog(),
        Box::new(MemoryStore::new(config(&["a", "b", "c"]))),
        Box::new(DenyProbe(Some(Capability::CompassSensor))),
    );
    let mut host = NoopHost;

    let report = ctx.populate(&mut host).unwrap();
    assert_eq!(report.built, vec![TileKey::from("a"), TileKey::from("b")]);
    assert_eq!(report.declined, vec![TileKey::from("c")]);

    let registry = ctx.registry();
    assert_eq!(registry.keys(), vec![TileKey::from("a"), TileKey::from("b")]);
    assert_eq!(registry.count(&TileKey::from("c")), 0);
}

#[test]
fn lock_transition_flips_locked_tile_only() {
    let mut cfg = config(&["a", "b"]);
    cfg.locked.insert(TileKey::from("a"));
    let ctx = PanelContext::new(
        catalog(),
        Box::new(MemoryStore::new(cfg)),
        Box::new(DenyProbe(None)),
    );
    let mut host = NoopHost;
    ctx.populate(&mut host).unwrap();

    let registry = ctx.registry();
    assert!(registry.tile_state(&TileKey::from("a")).unwrap().visible);
    let b_before = registry.tile_state(&TileKey::from("b")).unwrap();

    registry.on_lock_changed(LockState {
        showing: true,
        ..Default::default()
    });
    assert!(!registry.tile_state(&TileKey::from("a")).unwrap().visible);
    assert_eq!(
        registry.tile_state(&TileKey::from("b")).unwrap(),
        b_before,
        "the unlocked tile's state is untouched by the transition"
    );

    registry.on_lock_changed(LockState::default());
    assert!(registry.tile_state(&TileKey::from("a")).unwrap().visible);
}

#[test]
fn reconfiguration_replaces_every_instance() {
    let store = MemoryStore::new(config(&["a", "b", "c", "d", "e"]));
    let ctx = PanelContext::new(
        catalog(),
        Box::new(store),
        Box::new(DenyProbe(None)),
    );
    let mut host = NoopHost;
    ctx.populate(&mut host).unwrap();

    let registry = ctx.registry();
    assert_eq!(registry.len(), 5);
    let before: Vec<u64> = registry
        .keys()
        .iter()
        .map(|k| registry.instance_id(k).unwrap())
        .collect();

    ctx.dispatch_config_change(&ConfigChange::Membership, &mut host)
        .unwrap();

    assert_eq!(registry.len(), 5, "rebuild restored every key");
    let after: Vec<u64> = registry
        .keys()
        .iter()
        .map(|k| registry.instance_id(k).unwrap())
        .collect();
    for id in &after {
        assert!(
            !before.contains(id),
            "no instance from before the teardown is reused"
        );
    }
}

#[test]
fn listening_twice_acquires_once() {
    let ctx = PanelContext::new(
        catalog(),
        Box::new(MemoryStore::new(config(&["a"]))),
        Box::new(DenyProbe(None)),
    );
    let mut host = NoopHost;
    ctx.populate(&mut host).unwrap();

    let resources = shared_resources();
    let baseline = resources.acquired.load(Ordering::SeqCst);

    let key = TileKey::from("a");
    ctx.dispatch_targeted(&key, TileEvent::SetListening(true));
    ctx.dispatch_targeted(&key, TileEvent::SetListening(true));
    assert_eq!(
        resources.acquired.load(Ordering::SeqCst) - baseline,
        1,
        "second set_listening(true) created no second subscription"
    );

    ctx.dispatch_targeted(&key, TileEvent::SetListening(false));
    ctx.dispatch_targeted(&key, TileEvent::SetListening(false));
    assert_eq!(resources.released.load(Ordering::SeqCst), 1);
}
