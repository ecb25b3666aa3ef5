//! Reward Ledger — typed, ordered reward records parsed from a payload
//!
//! `outcome_type` strings are classified once here; nothing downstream
//! compares strings again.

use rf_stage::{FeatureVariant, JackpotTier};
use serde::{Deserialize, Serialize};

use crate::payload::{BonusPayload, RawReward};

/// Reward category, declared in payout order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Credits,
    Jackpot,
    ProgressiveJackpot,
    Bonus,
}

impl RewardKind {
    /// Fixed resolution order
    pub const RESOLUTION_ORDER: [RewardKind; 4] = [
        RewardKind::Credits,
        RewardKind::Jackpot,
        RewardKind::ProgressiveJackpot,
        RewardKind::Bonus,
    ];

    fn slot(&self) -> usize {
        match self {
            Self::Credits => 0,
            Self::Jackpot => 1,
            Self::ProgressiveJackpot => 2,
            Self::Bonus => 3,
        }
    }
}

/// What a record pays: credits or a nested bonus game, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardValue {
    Credits { amount: u64 },
    Bonus { payload: BonusPayload },
}

/// One classified reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub reel_index: usize,
    pub slot_position: usize,
    pub kind: RewardKind,
    /// Set for `Jackpot` and `ProgressiveJackpot`
    pub jackpot_tier: Option<JackpotTier>,
    pub value: RewardValue,
}

impl RewardRecord {
    /// Multiplier-adjusted credit amount (`None` for bonus records)
    pub fn credit_amount(&self) -> Option<u64> {
        match &self.value {
            RewardValue::Credits { amount } => Some(*amount),
            RewardValue::Bonus { .. } => None,
        }
    }

    pub fn bonus_payload(&self) -> Option<&BonusPayload> {
        match &self.value {
            RewardValue::Bonus { payload } => Some(payload),
            RewardValue::Credits { .. } => None,
        }
    }
}

/// Inputs the ledger needs besides the raw rewards
#[derive(Debug, Clone, Copy)]
pub struct LedgerContext {
    /// Active bet multiplier; server amounts are in base units
    pub bet_multiplier: u64,
    pub variant: FeatureVariant,
    /// Credit value of the active ladder tier (ladder variant)
    pub ladder_credit: Option<u64>,
    /// Every board slot locked; the progressive jackpot pays only then
    pub blackout: bool,
}

impl LedgerContext {
    pub fn new(bet_multiplier: u64, variant: FeatureVariant) -> Self {
        Self {
            bet_multiplier,
            variant,
            ladder_credit: None,
            blackout: false,
        }
    }

    pub fn with_ladder_credit(mut self, credit: Option<u64>) -> Self {
        self.ladder_credit = credit;
        self
    }

    pub fn with_blackout(mut self, blackout: bool) -> Self {
        self.blackout = blackout;
        self
    }
}

/// Rewards grouped by kind, each list in playback order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardLedger {
    records: [Vec<RewardRecord>; 4],
}

impl RewardLedger {
    /// Classify and order the terminal payload's rewards
    ///
    /// Pure: touches no board or presentation state. Entries that cannot be
    /// classified are dropped with a warning.
    pub fn parse(rewards: &[RawReward], ctx: &LedgerContext) -> Self {
        let mut ledger = Self::default();

        for raw in rewards {
            if let Some(record) = classify(raw, ctx) {
                ledger.records[record.kind.slot()].push(record);
            }
        }

        for list in &mut ledger.records {
            list.sort_by(|a, b| {
                a.reel_index
                    .cmp(&b.reel_index)
                    .then(b.slot_position.cmp(&a.slot_position))
            });
        }

        ledger
    }

    /// Records of one kind, in playback order
    pub fn records(&self, kind: RewardKind) -> &[RewardRecord] {
        &self.records[kind.slot()]
    }

    /// All records in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &RewardRecord> {
        RewardKind::RESOLUTION_ORDER
            .iter()
            .flat_map(move |kind| self.records(*kind).iter())
    }

    pub fn len(&self) -> usize {
        self.records.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.iter().all(Vec::is_empty)
    }

    pub fn has_kind(&self, kind: RewardKind) -> bool {
        !self.records(kind).is_empty()
    }

    /// Sum of the locally known credit amounts
    pub fn credit_total(&self) -> u64 {
        self.iter().filter_map(RewardRecord::credit_amount).sum()
    }

    /// Whether `(reel, row)` owns any reward
    pub fn owns_reward(&self, reel: usize, row: usize) -> bool {
        self.iter()
            .any(|r| r.reel_index == reel && r.slot_position == row)
    }
}

fn classify(raw: &RawReward, ctx: &LedgerContext) -> Option<RewardRecord> {
    let multiplied = |raw: &RawReward| -> Option<u64> {
        match raw.amount {
            Some(amount) => Some(amount.saturating_mul(ctx.bet_multiplier)),
            None => {
                log::warn!(
                    "{} reward at ({}, {}) has no amount, dropped",
                    raw.outcome_type,
                    raw.reel_index,
                    raw.slot_position
                );
                None
            }
        }
    };
    let record = |kind, jackpot_tier, value| RewardRecord {
        reel_index: raw.reel_index,
        slot_position: raw.slot_position,
        kind,
        jackpot_tier,
        value,
    };

    match raw.outcome_type.as_str() {
        "symbol_credit" => {
            let amount = multiplied(raw)?;
            Some(record(RewardKind::Credits, None, RewardValue::Credits { amount }))
        }
        "jackpot" => {
            let declared = raw.tier.as_deref().unwrap_or_default();
            let Some(tier) = JackpotTier::from_wire(declared) else {
                log::warn!("jackpot reward with unknown tier '{}' dropped", declared);
                return None;
            };
            if tier.is_progressive() && ctx.variant != FeatureVariant::Blackout {
                log::warn!("progressive jackpot reward outside the blackout variant dropped");
                return None;
            }
            if tier.is_progressive() && !ctx.blackout {
                log::warn!("progressive jackpot reward without a blackout dropped");
                return None;
            }
            let amount = multiplied(raw)?;
            let kind = if tier.is_progressive() {
                RewardKind::ProgressiveJackpot
            } else {
                RewardKind::Jackpot
            };
            Some(record(kind, Some(tier), RewardValue::Credits { amount }))
        }
        "bonus_game" => {
            let Some(payload) = raw.bonus_payload.clone() else {
                log::warn!("bonus_game reward without a bonus payload dropped");
                return None;
            };
            Some(record(
                RewardKind::Bonus,
                None,
                RewardValue::Bonus {
                    payload: BonusPayload(payload),
                },
            ))
        }
        "end_reward" if ctx.variant == FeatureVariant::Ladder => {
            let amount = match (ctx.ladder_credit, raw.amount) {
                (Some(credit), Some(declared)) => {
                    let declared = declared.saturating_mul(ctx.bet_multiplier);
                    if credit != declared {
                        log::warn!(
                            "ladder end reward {} differs from active tier value {}, paying tier value",
                            declared,
                            credit
                        );
                    }
                    credit
                }
                (Some(credit), None) => credit,
                (None, Some(_)) => multiplied(raw)?,
                (None, None) => {
                    log::warn!("end_reward without an active ladder tier or amount dropped");
                    return None;
                }
            };
            Some(record(RewardKind::Credits, None, RewardValue::Credits { amount }))
        }
        other => {
            log::warn!("unknown reward outcome_type '{}' dropped", other);
            None
        }
    }
}
