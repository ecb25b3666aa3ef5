//! Round gate — reentrancy guard and running payout total
//!
//! Single-threaded: the gate is shared by `Rc` between the feature session and
//! the host's spin-completion logic, which polls it between suspension points.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct RoundState {
    resolving: Cell<bool>,
    running_total: Cell<u64>,
}

/// Shared handle to the active round's resolution flag and payout counter
#[derive(Debug, Clone, Default)]
pub struct RoundGate {
    state: Rc<RoundState>,
}

impl RoundGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewards are being resolved
    pub fn is_resolving(&self) -> bool {
        self.state.resolving.get()
    }

    /// Whether spin-completion logic may end the round
    pub fn can_round_end(&self) -> bool {
        !self.is_resolving()
    }

    /// Running payout total of the active round
    pub fn running_total(&self) -> u64 {
        self.state.running_total.get()
    }

    /// Base spin win written outside a feature resolution
    pub fn record_base_win(&self, amount: u64) {
        debug_assert!(
            !self.is_resolving(),
            "base spin wrote the running total during feature resolution"
        );
        self.add(amount);
    }

    /// Start of a new round
    pub fn reset_total(&self) {
        self.state.running_total.set(0);
    }

    pub(crate) fn add(&self, amount: u64) {
        let total = self.state.running_total.get().saturating_add(amount);
        self.state.running_total.set(total);
    }

    /// Raise the resolving flag until the returned guard drops
    pub fn begin_resolving(&self) -> ResolvingGuard {
        debug_assert!(!self.is_resolving(), "reward resolution re-entered");
        self.state.resolving.set(true);
        ResolvingGuard { gate: self.clone() }
    }
}

/// Clears the resolving flag on drop
#[derive(Debug)]
pub struct ResolvingGuard {
    gate: RoundGate,
}

impl ResolvingGuard {
    /// Whether this guard holds `gate`
    pub fn guards(&self, gate: &RoundGate) -> bool {
        Rc::ptr_eq(&self.gate.state, &gate.state)
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        self.gate.state.resolving.set(false);
    }
}
