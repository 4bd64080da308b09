use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TILE IDENTITY
// ============================================================================

/// Opaque, stable identifier for one tile slot (e.g. "ringer_mode").
///
/// Unique within the registry at any instant: the same key may be destroyed
/// and later recreated, but never duplicated while live.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TileKey(String);

impl TileKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable name of an icon resource the host's rendering layer resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// DECLARATIVE TILE STATE
// ============================================================================

/// Declarative visual state a tile reports on each state-refresh request.
///
/// The host copies the whole value into its own state container on each
/// application, so it never observes a half-updated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TileState {
    pub visible: bool,
    pub icon: IconRef,
    pub label: String,
    /// On/off value for toggle-style tiles
    pub boolean_value: bool,
    /// Whether the icon may be mirrored in RTL layouts
    pub auto_mirror: bool,
}

impl Default for TileState {
    fn default() -> Self {
        Self::hidden()
    }
}

impl TileState {
    /// State for a tile that should not be shown at all.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            icon: IconRef::default(),
            label: String::new(),
            boolean_value: false,
            auto_mirror: false,
        }
    }
}

// ============================================================================
// LOCK STATE
// ============================================================================

/// Immutable snapshot of device lock-screen status.
///
/// Replaced wholesale on every keyguard transition; consumers always read
/// the latest snapshot, never a stale cached copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LockState {
    /// Keyguard is currently showing
    pub showing: bool,
    /// A secure unlock method (PIN/password/pattern) is configured
    pub secured: bool,
    /// Device is currently passcode-locked (keyguard not dismissable by swipe)
    pub locked: bool,
    /// A trust agent is managing the lock state
    pub trust_managed: bool,
}

// ============================================================================
// TARGETED LIFECYCLE EVENTS
// ============================================================================

/// Host-originated lifecycle event, tagged with a tile key by the sender
/// and routed to exactly one live instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum TileEvent {
    /// Recompute and re-apply declarative state
    RefreshState,
    /// Primary activation (tap)
    Click,
    /// Long-press activation
    LongClick,
    /// Secondary activation (dual-mode detail affordance)
    SecondaryClick,
    /// Host slot view was created; tile may push initial state
    ViewCreated,
    /// Start/stop listening to live data sources
    SetListening(bool),
    /// Tear the instance down and remove it from the registry
    Destroy,
}

// ============================================================================
// BROADCAST DOMAIN EVENTS
// ============================================================================

/// Audible ringer mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RingerMode {
    Normal,
    Vibrate,
    Silent,
}

impl RingerMode {
    /// Cycle order used by the ringer tile's primary activation.
    pub fn next(self) -> Self {
        match self {
            RingerMode::Normal => RingerMode::Vibrate,
            RingerMode::Vibrate => RingerMode::Silent,
            RingerMode::Silent => RingerMode::Normal,
        }
    }
}

/// App-originated event fanned out to every registered tile and every plain
/// broadcast subscriber, irrespective of tile identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum DomainEvent {
    BatteryChanged {
        /// Charge level in percent, 0..=100
        level: u8,
        charging: bool,
    },
    RingerModeChanged {
        mode: RingerMode,
    },
    /// Compass heading update in degrees clockwise from north
    HeadingChanged {
        degrees: f32,
    },
    /// A persisted setting changed outside the panel
    SettingChanged {
        key: String,
        value: serde_json::Value,
    },
    /// Escape hatch for transports carrying events the core has no type for
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

// ============================================================================
// CONFIGURATION-CHANGE EVENTS
// ============================================================================

/// Notification that persisted panel configuration changed.
///
/// Order/enablement/layout changes require the full teardown-and-rebuild
/// protocol; flag-only changes are applied in place on live instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum ConfigChange {
    /// Tile order or the enabled set changed
    Membership,
    /// Grid column count changed
    Columns(u32),
    /// Tile scale correction (percent offset) changed
    Scale(i32),
    /// A per-tile policy list changed (locked / locked-only / secured /
    /// dual-mode / hide-on-change membership)
    PolicyFlags,
    /// Some other small setting a tile may interpret
    Other(String),
}

impl ConfigChange {
    /// Whether this change invalidates the live tile set and requires the
    /// stop-the-world rebuild protocol.
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            ConfigChange::Membership | ConfigChange::Columns(_) | ConfigChange::Scale(_)
        )
    }
}
