//! The tile capability contract and its lifecycle.
//!
//! Every pluggable behavior on the panel implements [`Tile`]. There is no
//! subclassing ladder: concrete tiles embed [`TileRuntime`] by composition
//! for the shared lifecycle bookkeeping (flags, listening idempotence, the
//! destroyed latch) and call into the visibility policy through it.

use crate::policy;
use crate::Result;
use slate_config::PanelConfig;
use slate_events::{DomainEvent, LockState, TileKey, TileState};

/// Policy flags derived from persisted configuration membership lists.
///
/// Set at construction, re-derived on configuration refresh, otherwise
/// immutable until the owning tile is destroyed and recreated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFlags {
    pub enabled: bool,
    /// Hide while the keyguard is showing
    pub locked: bool,
    /// Show only while the keyguard is showing
    pub locked_only: bool,
    /// Hide while the keyguard is showing and passcode-locked
    pub secured: bool,
    /// Two activation targets in one slot: primary toggle + detail view
    pub dual_mode: bool,
    /// Hide while a value change is still in flight
    pub hide_on_change: bool,
}

impl TileFlags {
    /// Derive the flags for `key` from the configuration's membership lists.
    pub fn derive(key: &TileKey, config: &PanelConfig) -> Self {
        Self {
            enabled: config.enabled.contains(key),
            locked: config.locked.contains(key),
            locked_only: config.locked_only.contains(key),
            secured: config.secured.contains(key),
            dual_mode: config.dual_mode.contains(key),
            hide_on_change: config.hide_on_change.contains(key),
        }
    }
}

/// Context handed to a tile on each state-refresh request.
pub struct RefreshContext<'a> {
    /// Latest lock-screen snapshot
    pub lock: LockState,
    /// The domain event that prompted this refresh, when there was one
    pub event: Option<&'a DomainEvent>,
}

/// Lifecycle phase of one tile instance.
///
/// `Constructed → (Listening ⇄ NotListening) → Destroyed`; `Destroyed` is
/// terminal and no trait method is invoked after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Listening,
    NotListening,
    Destroyed,
}

/// The capability contract every tile plugin implements.
///
/// All methods run on the single event-dispatch thread. Errors returned here
/// are absorbed and logged at the dispatch boundary; a failing tile keeps
/// its last known-good declarative state and never takes the panel down.
pub trait Tile: Send {
    // === IDENTITY ===

    /// Stable key; never changes for the lifetime of the instance.
    fn key(&self) -> TileKey;

    /// Current policy flags, read by the distributor when enforcing the
    /// visibility policy on refreshed state.
    fn flags(&self) -> TileFlags;

    // === DECLARATIVE STATE ===

    /// Recompute declarative state. Must finish synchronously and must not
    /// block; slow work belongs behind `set_listening` with results fed back
    /// through the event queue.
    fn refresh_state(&mut self, cx: &RefreshContext<'_>) -> Result<TileState>;

    // === ACTIVATION ===

    fn on_primary_activate(&mut self) -> Result<()>;

    /// Returns whether the long-press was fully handled; `false` lets the
    /// host fall back to its default behavior.
    fn on_long_activate(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Returns whether the secondary activation was fully handled.
    fn on_secondary_activate(&mut self) -> Result<bool> {
        Ok(false)
    }

    // === LIFECYCLE ===

    /// `true` subscribes to whatever live data source the tile needs;
    /// `false` fully unsubscribes. The only place expensive resources are
    /// acquired. Must be idempotent per value.
    fn set_listening(&mut self, active: bool) -> Result<()>;

    /// Fan-out entry point for untargeted broadcasts.
    fn on_domain_event(&mut self, _event: &DomainEvent) -> Result<()> {
        Ok(())
    }

    /// Re-derive policy flags from persisted configuration without
    /// destroying the instance (small settings changes).
    fn configuration_refresh(&mut self, config: &PanelConfig) -> Result<()>;

    /// Host created the slot view for this tile.
    fn on_view_created(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release all resources. Safe to call at most once; a second call is a
    /// no-op, never an error.
    fn destroy(&mut self);
}

/// Shared per-instance lifecycle bookkeeping, embedded by concrete tiles.
///
/// Owns the policy flags, the lifecycle phase, listening idempotence, the
/// destroyed latch (so late async callbacks can be made no-ops), and the
/// hide-on-change window.
#[derive(Debug)]
pub struct TileRuntime {
    key: TileKey,
    flags: TileFlags,
    phase: Phase,
    change_in_flight: bool,
}

impl TileRuntime {
    pub fn new(key: TileKey, flags: TileFlags) -> Self {
        Self {
            key,
            flags,
            phase: Phase::Constructed,
            change_in_flight: false,
        }
    }

    /// Construct with flags derived from `config`.
    pub fn from_config(key: TileKey, config: &PanelConfig) -> Self {
        let flags = TileFlags::derive(&key, config);
        Self::new(key, flags)
    }

    pub fn key(&self) -> TileKey {
        self.key.clone()
    }

    pub fn flags(&self) -> TileFlags {
        self.flags
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Re-derive flags from a fresh configuration snapshot.
    pub fn refresh_flags(&mut self, config: &PanelConfig) {
        let next = TileFlags::derive(&self.key, config);
        if next != self.flags {
            log::debug!("Tile '{}': flags refreshed {:?}", self.key, next);
            self.flags = next;
        }
    }

    /// Apply a listening transition. Returns `true` when the underlying
    /// resource actually needs to be acquired or released; repeated calls
    /// with the same value return `false`, giving embedders idempotence for
    /// free.
    pub fn set_listening(&mut self, active: bool) -> bool {
        match (self.phase, active) {
            (Phase::Destroyed, _) => false,
            (Phase::Listening, true) => false,
            (Phase::Listening, false) => {
                self.phase = Phase::NotListening;
                true
            }
            (_, true) => {
                self.phase = Phase::Listening;
                true
            }
            (_, false) => {
                self.phase = Phase::NotListening;
                false
            }
        }
    }

    pub fn is_listening(&self) -> bool {
        self.phase == Phase::Listening
    }

    /// Latch destruction. Returns `true` on the first call only; embedders
    /// release their resources exactly when this returns `true`.
    pub fn destroy(&mut self) -> bool {
        if self.phase == Phase::Destroyed {
            return false;
        }
        self.phase = Phase::Destroyed;
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase == Phase::Destroyed
    }

    // === HIDE-ON-CHANGE WINDOW ===

    /// Mark a slow value change as started; while the window is open a
    /// hide-on-change tile reports itself invisible.
    pub fn begin_change(&mut self) {
        self.change_in_flight = true;
    }

    /// Mark the in-flight change as landed.
    pub fn end_change(&mut self) {
        self.change_in_flight = false;
    }

    pub fn change_in_flight(&self) -> bool {
        self.change_in_flight
    }

    /// Visibility under the current flags and lock snapshot, including the
    /// hide-on-change window.
    pub fn effective_visibility(&self, lock: &LockState) -> bool {
        if self.flags.hide_on_change && self.change_in_flight {
            return false;
        }
        policy::visible(&self.flags, lock)
    }
}
