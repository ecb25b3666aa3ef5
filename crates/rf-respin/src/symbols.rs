//! Symbol slots and their lock state

use serde::{Deserialize, Serialize};

/// Lock state of one board slot within a feature activation
///
/// States only move forward: `Free → LockedLooping → Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Slot still spins
    #[default]
    Free,
    /// Slot locked, anticipation loop eligible
    LockedLooping,
    /// Slot finished resolution
    Resolved,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

/// Result of a lock request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Slot moved from `Free` to `LockedLooping`
    Locked,
    /// Slot was already locked this activation, nothing changed
    AlreadyLocked,
    /// Position is not on the board
    OutOfBounds,
}

/// Symbol identity plus lock state held by one reel slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Symbol name, `None` for the blank placeholder
    pub name: Option<String>,
    state: LockState,
    looping: bool,
}

impl SymbolRef {
    /// Blank placeholder slot
    pub fn blank() -> Self {
        Self::default()
    }

    /// Free slot showing a symbol
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            state: LockState::Free,
            looping: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_none()
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Whether the anticipation loop is currently running
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Lock the slot showing `name` and start its loop
    pub(crate) fn lock(&mut self, name: impl Into<String>) -> LockOutcome {
        if self.state.is_locked() {
            return LockOutcome::AlreadyLocked;
        }
        self.name = Some(name.into());
        self.state = LockState::LockedLooping;
        self.looping = true;
        LockOutcome::Locked
    }

    /// Terminate the loop; returns whether it was running
    pub(crate) fn stop_loop(&mut self) -> bool {
        std::mem::replace(&mut self.looping, false)
    }

    /// Move a locked slot to `Resolved`; returns whether the state changed
    pub(crate) fn resolve(&mut self) -> bool {
        self.looping = false;
        if self.state == LockState::LockedLooping {
            self.state = LockState::Resolved;
            true
        } else {
            false
        }
    }

    /// Back to the blank placeholder, ready for the next activation
    pub(crate) fn reset(&mut self) {
        *self = Self::blank();
    }
}
