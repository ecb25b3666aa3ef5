//! Ladder Progression — multiplier tiers unlocked by trigger symbol count

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LadderTierSpec, validate_ladder_table};

/// One ladder tier with its wager-derived value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderTier {
    pub threshold: u32,
    pub multiplier: u64,
    /// `multiplier × wager`
    pub credit_value: u64,
}

/// Tier activation change produced by `activate_tier`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierChange {
    pub previous: Option<usize>,
    pub current: usize,
    pub credit_value: u64,
}

/// Ladder state for one feature activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderProgression {
    tiers: Vec<LadderTier>,
    active: Option<usize>,
    wager: u64,
}

impl LadderProgression {
    /// Build from a validated tier table
    pub fn new(table: &[LadderTierSpec], wager: u64) -> Result<Self, ConfigError> {
        validate_ladder_table(table)?;
        let tiers = table
            .iter()
            .map(|spec| LadderTier {
                threshold: spec.threshold,
                multiplier: spec.multiplier,
                credit_value: spec.multiplier.saturating_mul(wager),
            })
            .collect();
        Ok(Self {
            tiers,
            active: None,
            wager,
        })
    }

    pub fn tiers(&self) -> &[LadderTier] {
        &self.tiers
    }

    pub fn active_tier(&self) -> Option<usize> {
        self.active
    }

    pub fn wager(&self) -> u64 {
        self.wager
    }

    /// Credit value of the active tier
    pub fn active_credit_value(&self) -> Option<u64> {
        self.active.and_then(|i| self.tiers.get(i)).map(|t| t.credit_value)
    }

    /// Highest tier whose threshold is within `cumulative_count`
    pub fn advance(&self, cumulative_count: u32) -> Option<usize> {
        self.tiers
            .iter()
            .take_while(|t| t.threshold <= cumulative_count)
            .count()
            .checked_sub(1)
    }

    /// Activate `index` if it is above the current tier
    ///
    /// Equal or lower tiers are a no-op; the ladder never regresses.
    pub fn activate_tier(&mut self, index: usize) -> Option<TierChange> {
        let tier = self.tiers.get(index)?;
        if self.active.is_some_and(|current| index <= current) {
            return None;
        }
        let change = TierChange {
            previous: self.active,
            current: index,
            credit_value: tier.credit_value,
        };
        self.active = Some(index);
        Some(change)
    }

    /// Advance to the tier for `cumulative_count` and activate it
    pub fn progress(&mut self, cumulative_count: u32) -> Option<TierChange> {
        self.advance(cumulative_count)
            .and_then(|index| self.activate_tier(index))
    }

    /// Recompute every tier's value; the active tier is unchanged
    pub fn on_wager_changed(&mut self, wager: u64) {
        self.wager = wager;
        for tier in &mut self.tiers {
            tier.credit_value = tier.multiplier.saturating_mul(wager);
        }
    }

    /// Clear the active tier for the next activation
    pub fn reset(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> LadderProgression {
        let table = [
            LadderTierSpec::new(1, 2),
            LadderTierSpec::new(3, 5),
            LadderTierSpec::new(5, 20),
        ];
        LadderProgression::new(&table, 10).unwrap()
    }

    #[test]
    fn test_credit_values() {
        let ladder = ladder();
        let values: Vec<u64> = ladder.tiers().iter().map(|t| t.credit_value).collect();
        assert_eq!(values, vec![20, 50, 200]);
    }

    #[test]
    fn test_advance_highest_qualifying() {
        let ladder = ladder();
        assert_eq!(ladder.advance(0), None);
        assert_eq!(ladder.advance(1), Some(0));
        assert_eq!(ladder.advance(2), Some(0));
        assert_eq!(ladder.advance(4), Some(1));
        assert_eq!(ladder.advance(99), Some(2));
    }

    #[test]
    fn test_counts_skip_a_tier() {
        let mut ladder = ladder();
        let activations: Vec<Option<usize>> = [1, 2, 5]
            .iter()
            .map(|count| ladder.progress(*count).map(|c| c.current))
            .collect();
        assert_eq!(activations, vec![Some(0), None, Some(2)]);
    }

    #[test]
    fn test_never_regresses() {
        let mut ladder = ladder();
        ladder.activate_tier(2);
        assert_eq!(ladder.activate_tier(1), None);
        assert_eq!(ladder.activate_tier(2), None);
        assert_eq!(ladder.active_tier(), Some(2));
        assert_eq!(ladder.activate_tier(7), None);
    }

    #[test]
    fn test_change_reports_previous() {
        let mut ladder = ladder();
        let first = ladder.activate_tier(0).unwrap();
        assert_eq!(first.previous, None);
        let second = ladder.activate_tier(1).unwrap();
        assert_eq!(second.previous, Some(0));
        assert_eq!(second.credit_value, 50);
    }

    #[test]
    fn test_wager_change_keeps_active_tier() {
        let mut ladder = ladder();
        ladder.activate_tier(1);
        ladder.on_wager_changed(3);
        assert_eq!(ladder.active_tier(), Some(1));
        assert_eq!(ladder.active_credit_value(), Some(15));
    }

    #[test]
    fn test_rejects_unordered_table() {
        let table = [LadderTierSpec::new(3, 2), LadderTierSpec::new(1, 5)];
        assert!(LadderProgression::new(&table, 1).is_err());
    }
}
