//! Lock-screen-aware visibility policy.
//!
//! A pure function over the tile's policy flags and the current lock
//! snapshot. Evaluated every time declarative state is recomputed and every
//! time the lock state changes; never cached across a lock transition.

use crate::tile::TileFlags;
use slate_events::LockState;

/// Effective visibility of a tile.
///
/// `locked` tiles hide while the keyguard is showing; `locked_only` tiles
/// show only while it is showing; `secured` tiles hide specifically when the
/// device is both showing the keyguard and passcode-locked (stricter than
/// `locked`, which hides on showing alone regardless of passcode state).
pub fn visible(flags: &TileFlags, lock: &LockState) -> bool {
    flags.enabled
        && (!flags.locked || !lock.showing)
        && (!flags.locked_only || lock.showing)
        && (!flags.secured || !(lock.showing && lock.locked))
}
