//! Battery readout tile.
//!
//! Pure consumer: level and charging state arrive as domain broadcasts, so
//! listening acquires nothing.

use slate_core::{PanelConfig, RefreshContext, Result, Tile, TileFlags, TileRuntime};
use slate_events::{DomainEvent, IconRef, TileKey, TileState};

pub const KEY: &str = "battery";

pub struct BatteryTile {
    rt: TileRuntime,
    level: u8,
    charging: bool,
    /// No broadcast seen yet; show a placeholder instead of a made-up level
    known: bool,
}

impl BatteryTile {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            rt: TileRuntime::from_config(TileKey::from(KEY), config),
            level: 0,
            charging: false,
            known: false,
        }
    }
}

impl Tile for BatteryTile {
    fn key(&self) -> TileKey {
        self.rt.key()
    }

    fn flags(&self) -> TileFlags {
        self.rt.flags()
    }

    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState> {
        let label = if self.known {
            format!("Battery {}%", self.level)
        } else {
            "Battery".to_string()
        };
        let icon = if self.charging {
            IconRef::new("ic_battery_charging")
        } else {
            IconRef::new("ic_battery")
        };
        Ok(TileState {
            visible: self.rt.effective_visibility(&cx.lock),
            icon,
            label,
            boolean_value: self.charging,
            auto_mirror: false,
        })
    }

    fn on_primary_activate(&mut self) -> Result<()> {
        // Read-only tile; tapping does nothing
        Ok(())
    }

    fn set_listening(&mut self, active: bool) -> Result<()> {
        self.rt.set_listening(active);
        Ok(())
    }

    fn on_domain_event(&mut self, event: &DomainEvent) -> Result<()> {
        if let DomainEvent::BatteryChanged { level, charging } = event {
            self.level = (*level).min(100);
            self.charging = *charging;
            self.known = true;
        }
        Ok(())
    }

    fn configuration_refresh(&mut self, config: &PanelConfig) -> Result<()> {
        self.rt.refresh_flags(config);
        Ok(())
    }

    fn destroy(&mut self) {
        self.rt.destroy();
    }
}
