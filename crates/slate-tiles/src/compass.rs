//! Compass tile.
//!
//! Only constructed on hosts with a compass sensor (the catalog declines it
//! elsewhere). Heading updates arrive as broadcasts from the sensor glue
//! while the tile is listening; outside the listening window the reading is
//! dropped so a stale heading is never shown.

use slate_core::{PanelConfig, RefreshContext, Result, Tile, TileFlags, TileRuntime};
use slate_events::{DomainEvent, IconRef, TileKey, TileState};

pub const KEY: &str = "compass";

pub struct CompassTile {
    rt: TileRuntime,
    heading: Option<f32>,
}

impl CompassTile {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            rt: TileRuntime::from_config(TileKey::from(KEY), config),
            heading: None,
        }
    }
}

/// "N 12°"-style label for a heading in degrees clockwise from north.
fn heading_label(degrees: f32) -> String {
    let normalized = degrees.rem_euclid(360.0);
    let cardinal = match normalized {
        d if !(22.5..337.5).contains(&d) => "N",
        d if d < 67.5 => "NE",
        d if d < 112.5 => "E",
        d if d < 157.5 => "SE",
        d if d < 202.5 => "S",
        d if d < 247.5 => "SW",
        d if d < 292.5 => "W",
        _ => "NW",
    };
    format!("{} {:.0}\u{00B0}", cardinal, normalized)
}

impl Tile for CompassTile {
    fn key(&self) -> TileKey {
        self.rt.key()
    }

    fn flags(&self) -> TileFlags {
        self.rt.flags()
    }

    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState> {
        let label = match self.heading {
            Some(degrees) => heading_label(degrees),
            None => "Compass".to_string(),
        };
        Ok(TileState {
            visible: self.rt.effective_visibility(&cx.lock),
            icon: IconRef::new("ic_compass"),
            label,
            boolean_value: self.heading.is_some(),
            auto_mirror: false,
        })
    }

    fn on_primary_activate(&mut self) -> Result<()> {
        // Read-only tile
        Ok(())
    }

    fn set_listening(&mut self, active: bool) -> Result<()> {
        if self.rt.set_listening(active) && !active {
            self.heading = None;
        }
        Ok(())
    }

    fn on_domain_event(&mut self, event: &DomainEvent) -> Result<()> {
        if let DomainEvent::HeadingChanged { degrees } = event {
            if self.rt.is_listening() {
                self.heading = Some(*degrees);
            }
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
