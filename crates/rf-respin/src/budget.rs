//! Spin Budget Tracker — remaining respins and blackout detection

use serde::{Deserialize, Serialize};

/// Respin budget of one feature activation
///
/// The server decrements the meter; this mirrors it. The budget is unset
/// between rounds and established by the first payload of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinBudget {
    start_value: Option<u32>,
    remaining: Option<u32>,
    locked_slots: usize,
    total_slots: usize,
}

impl SpinBudget {
    /// Unset budget for a board of `total_slots`
    pub fn new(total_slots: usize) -> Self {
        Self {
            total_slots,
            ..Default::default()
        }
    }

    /// Back to unset, at the start of every base/free-spin round
    pub fn reset(&mut self) {
        *self = Self::new(self.total_slots);
    }

    /// Establish the start value; ignored once set within the activation
    pub fn initialize(&mut self, start_value: u32) -> bool {
        if self.start_value.is_some() {
            log::debug!("spin budget already initialized, start value {} ignored", start_value);
            return false;
        }
        self.start_value = Some(start_value);
        self.remaining = Some(start_value);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.start_value.is_some()
    }

    /// Count slots locked outside a reevaluation (trigger symbols on entry)
    pub fn record_locked(&mut self, count: usize) {
        self.locked_slots = (self.locked_slots + count).min(self.total_slots);
    }

    /// Mirror one reevaluation
    ///
    /// A missing meter value is taken as one respin consumed.
    pub fn on_reevaluation(&mut self, current_remaining: Option<u32>, newly_locked_count: usize) {
        self.remaining = match current_remaining {
            Some(value) => Some(value),
            None => {
                log::warn!("reevaluation without spin meter value, assuming one respin consumed");
                Some(self.remaining.unwrap_or(0).saturating_sub(1))
            }
        };
        self.record_locked(newly_locked_count);
    }

    pub fn start_value(&self) -> Option<u32> {
        self.start_value
    }

    /// Remaining respins (0 while unset)
    pub fn remaining(&self) -> u32 {
        self.remaining.unwrap_or(0)
    }

    pub fn locked_slots(&self) -> usize {
        self.locked_slots
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// No respins left
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Every board slot locked, regardless of remaining budget
    pub fn is_blackout(&self) -> bool {
        self.total_slots > 0 && self.locked_slots >= self.total_slots
    }

    /// Respins end on exhaustion or blackout
    pub fn respins_finished(&self) -> bool {
        self.is_exhausted() || self.is_blackout()
    }
}
