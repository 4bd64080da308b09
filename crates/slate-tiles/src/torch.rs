//! Torchlight tile.
//!
//! The torch hardware is an acquired resource: the service handle is taken
//! while the tile is listening and dropped when it stops. Toggles are
//! asynchronous (the request goes to the service, the confirmed state comes
//! back as a broadcast), so a hide-on-change configuration keeps the tile
//! hidden for the in-flight window instead of showing a value that may still
//! bounce back.

use slate_core::{PanelConfig, PanelSender, RefreshContext, Result, Tile, TileFlags, TileRuntime};
use slate_events::{DomainEvent, IconRef, TileKey, TileState};

pub const KEY: &str = "torch";

/// Event name carrying the confirmed torch state.
pub const TORCH_STATE_EVENT: &str = "torch_state";

/// Camera/torch service boundary.
pub trait TorchService: Send {
    /// Take the torch handle. Called once per listening window.
    fn acquire(&mut self) -> anyhow::Result<()>;

    /// Return the handle. Must be safe when nothing is held.
    fn release(&mut self);

    /// Request the torch on or off; the confirmed state arrives later as a
    /// `torch_state` broadcast.
    fn request(&mut self, on: bool) -> anyhow::Result<()>;
}

/// Demo service: confirms every request immediately by posting the
/// `torch_state` broadcast back through the event queue.
pub struct LoopbackTorch {
    events: PanelSender,
    held: bool,
}

impl LoopbackTorch {
    pub fn new(events: PanelSender) -> Self {
        Self {
            events,
            held: false,
        }
    }
}

impl TorchService for LoopbackTorch {
    fn acquire(&mut self) -> anyhow::Result<()> {
        self.held = true;
        Ok(())
    }

    fn release(&mut self) {
        self.held = false;
    }

    fn request(&mut self, on: bool) -> anyhow::Result<()> {
        if !self.held {
            anyhow::bail!("torch handle not held");
        }
        self.events.post_broadcast(DomainEvent::Custom {
            name: TORCH_STATE_EVENT.to_string(),
            payload: serde_json::json!({ "on": on }),
        });
        Ok(())
    }
}

pub struct TorchTile {
    rt: TileRuntime,
    service: Box<dyn TorchService>,
    on: bool,
}

impl TorchTile {
    pub fn new(config: &PanelConfig, service: Box<dyn TorchService>) -> Self {
        Self {
            rt: TileRuntime::from_config(TileKey::from(KEY), config),
            service,
            on: false,
        }
    }
}

impl Tile for TorchTile {
    fn key(&self) -> TileKey {
        self.rt.key()
    }

    fn flags(&self) -> TileFlags {
        self.rt.flags()
    }

    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState> {
        Ok(TileState {
            visible: self.rt.effective_visibility(&cx.lock),
            icon: IconRef::new(if self.on { "ic_torch_on" } else { "ic_torch_off" }),
            label: "Torch".to_string(),
            boolean_value: self.on,
            auto_mirror: false,
        })
    }

    fn on_primary_activate(&mut self) -> Result<()> {
        if !self.rt.is_listening() {
            log::debug!("TorchTile: ignoring tap while not listening");
            return Ok(());
        }
        self.rt.begin_change();
        if let Err(e) = self.service.request(!self.on) {
            self.rt.end_change();
            return Err(e);
        }
        Ok(())
    }

    fn set_listening(&mut self, active: bool) -> Result<()> {
        if self.rt.set_listening(active) {
            if active {
                self.service.acquire()?;
            } else {
                self.service.release();
                self.rt.end_change();
            }
        }
        Ok(())
    }

    fn on_domain_event(&mut self, event: &DomainEvent) -> Result<()> {
        if let DomainEvent::Custom { name, payload } = event {
            if name == TORCH_STATE_EVENT {
                self.on = payload.get("on").and_then(|v| v.as_bool()).unwrap_or(false);
                self.rt.end_change();
            }
        }
        Ok(())
    }

    fn configuration_refresh(&mut self, config: &PanelConfig) -> Result<()> {
        self.rt.refresh_flags(config);
        Ok(())
    }

    fn destroy(&mut self) {
        if self.rt.destroy() {
            self.service.release();
        }
    }
}
