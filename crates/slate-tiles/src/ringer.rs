//! Ringer mode tile.
//!
//! Dual-mode: primary activation cycles the audible mode, secondary opens
//! the detail view when the configuration grants the tile two targets.
//! Mode changes made elsewhere arrive back as broadcasts and are mirrored.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use slate_core::{PanelConfig, PanelSender, RefreshContext, Result, Tile, TileFlags, TileRuntime};
use slate_events::{DomainEvent, IconRef, RingerMode, TileKey, TileState};

pub const KEY: &str = "ringer_mode";

/// Per-kind settings, surfaced to configuration UIs via the catalog schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RingerSettings {
    /// Skip the silent mode when cycling (Normal ⇄ Vibrate)
    #[serde(default)]
    pub skip_silent: bool,
}

pub(crate) fn settings_schema() -> schemars::schema::RootSchema {
    schema_for!(RingerSettings)
}

pub struct RingerTile {
    rt: TileRuntime,
    mode: RingerMode,
    settings: RingerSettings,
    events: PanelSender,
}

impl RingerTile {
    pub fn new(config: &PanelConfig, events: PanelSender) -> Self {
        Self {
            rt: TileRuntime::from_config(TileKey::from(KEY), config),
            mode: RingerMode::Normal,
            settings: RingerSettings::default(),
            events,
        }
    }

    fn next_mode(&self) -> RingerMode {
        let next = self.mode.next();
        if self.settings.skip_silent && next == RingerMode::Silent {
            next.next()
        } else {
            next
        }
    }
}

impl Tile for RingerTile {
    fn key(&self) -> TileKey {
        self.rt.key()
    }

    fn flags(&self) -> TileFlags {
        self.rt.flags()
    }

    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState> {
        let (icon, label) = match self.mode {
            RingerMode::Normal => ("ic_ringer_audible", "Ring"),
            RingerMode::Vibrate => ("ic_ringer_vibrate", "Vibrate"),
            RingerMode::Silent => ("ic_ringer_silent", "Silent"),
        };
        Ok(TileState {
            visible: self.rt.effective_visibility(&cx.lock),
            icon: IconRef::new(icon),
            label: label.to_string(),
            boolean_value: self.mode == RingerMode::Normal,
            auto_mirror: false,
        })
    }

    fn on_primary_activate(&mut self) -> Result<()> {
        self.mode = self.next_mode();
        log::debug!("RingerTile: mode -> {:?}", self.mode);
        // Inform the rest of the system the way an external change would
        self.events
            .post_broadcast(DomainEvent::RingerModeChanged { mode: self.mode });
        Ok(())
    }

    fn on_secondary_activate(&mut self) -> Result<bool> {
        if !self.rt.flags().dual_mode {
            return Ok(false);
        }
        log::debug!("RingerTile: opening sound settings detail");
        Ok(true)
    }

    fn set_listening(&mut self, active: bool) -> Result<()> {
        self.rt.set_listening(active);
        Ok(())
    }

    fn on_domain_event(&mut self, event: &DomainEvent) -> Result<()> {
        match event {
            DomainEvent::RingerModeChanged { mode } => self.mode = *mode,
            DomainEvent::SettingChanged { key, value } if key == "ringer_mode.skip_silent" => {
                self.settings.skip_silent = value.as_bool().unwrap_or(false);
            }
            _ => {}
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

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::EventQueue;
    use slate_events::LockState;
    use std::collections::BTreeSet;

    fn tile() -> (RingerTile, EventQueue) {
        let queue = EventQueue::new();
        let config = PanelConfig {
            enabled: BTreeSet::from([TileKey::from(KEY)]),
            dual_mode: BTreeSet::from([TileKey::from(KEY)]),
            ..Default::default()
        };
        (RingerTile::new(&config, queue.sender()), queue)
    }

    fn refresh(tile: &mut RingerTile) -> TileState {
        let cx = RefreshContext {
            lock: LockState::default(),
            event: None,
        };
        tile.refresh_state(&cx).unwrap()
    }

    #[test]
    fn primary_cycles_and_announces() {
        let (mut tile, queue) = tile();
        tile.on_primary_activate().unwrap();
        assert_eq!(tile.mode, RingerMode::Vibrate);
        assert_eq!(refresh(&mut tile).label, "Vibrate");
        assert_eq!(queue.drain().len(), 1, "mode change was broadcast");
    }

    #[test]
    fn skip_silent_setting_shortens_the_cycle() {
        let (mut tile, _queue) = tile();
        tile.on_domain_event(&DomainEvent::SettingChanged {
            key: "ringer_mode.skip_silent".into(),
            value: serde_json::Value::Bool(true),
        })
        .unwrap();

        tile.on_primary_activate().unwrap();
        assert_eq!(tile.mode, RingerMode::Vibrate);
        tile.on_primary_activate().unwrap();
        assert_eq!(tile.mode, RingerMode::Normal, "silent was skipped");
    }

    #[test]
    fn secondary_respects_dual_mode_flag() {
        let (mut tile, _queue) = tile();
        assert!(tile.on_secondary_activate().unwrap());

        let plain = PanelConfig {
            enabled: BTreeSet::from([TileKey::from(KEY)]),
            ..Default::default()
        };
        tile.configuration_refresh(&plain).unwrap();
        assert!(
            !tile.on_secondary_activate().unwrap(),
            "host falls back without dual mode"
        );
    }

    #[test]
    fn external_mode_change_is_mirrored() {
        let (mut tile, _queue) = tile();
        tile.on_domain_event(&DomainEvent::RingerModeChanged {
            mode: RingerMode::Silent,
        })
        .unwrap();
        assert_eq!(refresh(&mut tile).label, "Silent");
        assert!(!refresh(&mut tile).boolean_value);
    }
}
