//! Persisted panel configuration.
//!
//! Read-only from the core's perspective: a settings UI writes the file and
//! the change arrives back into the core as a configuration-changed event.

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slate_events::TileKey;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Persisted panel configuration: tile membership, policy lists, and the
/// layout-affecting knobs that trigger a full rebuild when changed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PanelConfig {
    /// Tile keys in display order; also the set considered for construction
    #[serde(default)]
    pub tile_order: Vec<TileKey>,

    /// Keys the user has enabled
    #[serde(default)]
    pub enabled: BTreeSet<TileKey>,

    /// Keys hidden while the keyguard is showing
    #[serde(default)]
    pub locked: BTreeSet<TileKey>,

    /// Keys shown only while the keyguard is showing
    #[serde(default)]
    pub locked_only: BTreeSet<TileKey>,

    /// Keys hidden while the keyguard is showing and passcode-locked
    #[serde(default)]
    pub secured: BTreeSet<TileKey>,

    /// Keys with two activation targets (primary toggle + detail view)
    #[serde(default)]
    pub dual_mode: BTreeSet<TileKey>,

    /// Keys hidden while a value change is still in flight
    #[serde(default)]
    pub hide_on_change: BTreeSet<TileKey>,

    /// Grid column count
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Tile scale correction in percent, relative to the host default
    #[serde(default)]
    pub scale_correction: i32,
}

fn default_columns() -> u32 {
    3
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            tile_order: Vec::new(),
            enabled: BTreeSet::new(),
            locked: BTreeSet::new(),
            locked_only: BTreeSet::new(),
            secured: BTreeSet::new(),
            dual_mode: BTreeSet::new(),
            hide_on_change: BTreeSet::new(),
            columns: default_columns(),
            scale_correction: 0,
        }
    }
}

impl PanelConfig {
    /// Keys eligible for construction: the order list filtered by enablement.
    pub fn active_order(&self) -> Vec<TileKey> {
        self.tile_order
            .iter()
            .filter(|k| self.enabled.contains(k))
            .cloned()
            .collect()
    }

    /// Drop contradictory list memberships.
    ///
    /// `locked` and `locked_only` are mutually exclusive at configuration-edit
    /// time; if a stale file carries a key in both, `locked` wins and the key
    /// is removed from `locked_only`.
    pub fn normalize(&mut self) {
        let both: Vec<TileKey> = self
            .locked_only
            .intersection(&self.locked)
            .cloned()
            .collect();
        for key in both {
            log::warn!(
                "Config: '{}' is in both locked and locked_only; keeping locked",
                key
            );
            self.locked_only.remove(&key);
        }
    }
}

/// Synchronously readable source of persisted configuration.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> anyhow::Result<PanelConfig>;
}

impl<S: ConfigStore + ?Sized> ConfigStore for std::sync::Arc<S> {
    fn load(&self) -> anyhow::Result<PanelConfig> {
        (**self).load()
    }
}

/// File-backed store reading a TOML panel configuration.
pub struct TomlStore {
    path: PathBuf,
}

impl TomlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Probe the usual locations for `slate.toml`: the working directory,
    /// `./configs/`, then the user config directory.
    pub fn discover() -> Option<Self> {
        let mut candidates = vec![
            PathBuf::from("slate.toml"),
            PathBuf::from("configs/slate.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("slate").join("slate.toml"));
        }

        candidates
            .into_iter()
            .find(|p| p.exists())
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for TomlStore {
    fn load(&self) -> anyhow::Result<PanelConfig> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config: {}", self.path.display()))?;
        let mut config: PanelConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", self.path.display()))?;
        config.normalize();
        Ok(config)
    }
}

/// In-memory store for tests and scripted hosts. `replace` simulates a
/// settings UI writing the file before a configuration-changed event fires.
pub struct MemoryStore {
    config: RwLock<PanelConfig>,
}

impl MemoryStore {
    pub fn new(mut config: PanelConfig) -> Self {
        config.normalize();
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn replace(&self, mut config: PanelConfig) {
        config.normalize();
        *self.config.write().expect("config store poisoned") = config;
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> anyhow::Result<PanelConfig> {
        Ok(self.config.read().expect("config store poisoned").clone())
    }
}
