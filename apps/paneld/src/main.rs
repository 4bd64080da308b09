//! Scripted host simulation for the tile framework.
//!
//! Wires config + catalog + registry together the way a real panel host
//! would, then runs a short boot / interact / lock / reconfigure sequence
//! and prints the resulting tile states. `RUST_LOG=debug` shows the
//! dispatch decisions along the way.

use anyhow::Result;
use slate_config::{ConfigStore, MemoryStore, PanelConfig, TomlStore};
use slate_core::{
    BuildVariant, Capability, CapabilityProbe, ConfigChange, HostPanel, LockState, PanelContext,
    TileEvent, TileKey,
};
use slate_events::DomainEvent;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Grants everything except the compass, so one catalog decline shows up in
/// every run.
struct SimProbe;

impl CapabilityProbe for SimProbe {
    fn has(&self, capability: Capability) -> bool {
        capability != Capability::CompassSensor
    }

    fn variant(&self) -> BuildVariant {
        BuildVariant::Full
    }
}

/// Host stand-in: real hosts inflate and tear down view hierarchies here.
struct SimHost;

impl HostPanel for SimHost {
    fn teardown_panel(&mut self) -> Result<()> {
        log::info!("Host: tearing down panel view");
        Ok(())
    }

    fn rebuild_panel(&mut self, order: &[TileKey]) -> Result<()> {
        log::info!(
            "Host: rebuilding panel with order [{}]",
            order
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }
}

fn default_config() -> PanelConfig {
    let keys = |names: &[&str]| -> BTreeSet<TileKey> {
        names.iter().map(|n| TileKey::from(*n)).collect()
    };
    PanelConfig {
        tile_order: vec![
            "battery".into(),
            "ringer_mode".into(),
            "torch".into(),
            "compass".into(),
        ],
        enabled: keys(&["battery", "ringer_mode", "torch", "compass"]),
        locked: keys(&["torch"]),
        secured: keys(&["ringer_mode"]),
        dual_mode: keys(&["ringer_mode"]),
        hide_on_change: keys(&["torch"]),
        ..Default::default()
    }
}

fn print_panel(ctx: &PanelContext, heading: &str) {
    println!("--- {heading} ---");
    let registry = ctx.registry();
    for key in registry.keys() {
        match registry.tile_state(&key) {
            Some(state) if state.visible => println!(
                "  [{}] {} ({})",
                if state.boolean_value { "x" } else { " " },
                state.label,
                key
            ),
            Some(_) => println!("  ( hidden ) ({key})"),
            None => println!("  ( no state yet ) ({key})"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let store = Arc::new(MemoryStore::new(match TomlStore::discover() {
        Some(file) => {
            log::info!("Loading panel config from {}", file.path().display());
            file.load()?
        }
        None => default_config(),
    }));

    let ctx = PanelContext::new(
        slate_tiles::builtin_catalog(),
        Box::new(Arc::clone(&store)),
        Box::new(SimProbe),
    );
    let mut host = SimHost;

    // Boot: construct the configured tile set (compass declines)
    let report = ctx.populate(&mut host)?;
    log::info!(
        "Boot: {} built, {:?} declined",
        report.built.len(),
        report.declined
    );

    // The panel comes on screen: views exist and tiles start listening
    for key in ctx.registry().keys() {
        ctx.dispatch_targeted(&key, TileEvent::ViewCreated);
        ctx.dispatch_targeted(&key, TileEvent::SetListening(true));
    }
    ctx.dispatch_broadcast(&DomainEvent::BatteryChanged {
        level: 73,
        charging: false,
    });
    print_panel(&ctx, "after boot");

    // Tap the torch; its confirmation comes back through the queue
    ctx.dispatch_targeted(&TileKey::from("torch"), TileEvent::Click);
    print_panel(&ctx, "torch toggling (hidden while in flight)");
    ctx.pump(&mut host)?;
    print_panel(&ctx, "torch confirmed");

    // Keyguard comes up: the locked torch hides, secured ringer survives a
    // swipe keyguard
    ctx.lock_monitor().feed(LockState {
        showing: true,
        secured: false,
        locked: false,
        trust_managed: false,
    });
    ctx.pump(&mut host)?;
    print_panel(&ctx, "keyguard showing (swipe)");

    ctx.lock_monitor().feed(LockState {
        showing: true,
        secured: true,
        locked: true,
        trust_managed: false,
    });
    ctx.pump(&mut host)?;
    print_panel(&ctx, "keyguard showing (passcode)");

    ctx.lock_monitor().feed(LockState::default());
    ctx.pump(&mut host)?;
    print_panel(&ctx, "unlocked");

    // A settings UI reorders the panel; the whole set is rebuilt
    let mut reordered = store.load()?;
    reordered.tile_order.reverse();
    store.replace(reordered);
    ctx.dispatch_config_change(&ConfigChange::Membership, &mut host)?;
    print_panel(&ctx, "after reorder");

    Ok(())
}
