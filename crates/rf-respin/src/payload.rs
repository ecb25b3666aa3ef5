//! Reevaluation payload wire types
//!
//! Every field the server may omit is optional or defaulted; the session
//! decides the fallback, decoding never rejects a payload for a missing field.

use serde::{Deserialize, Serialize};

/// One respin's server outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReevaluationPayload {
    /// Respin budget at activation, sent once on the first payload
    #[serde(default, alias = "spinMeterStartValue")]
    pub spin_meter_start_value: Option<u32>,

    /// Respins remaining after this payload
    #[serde(default, alias = "spinMeterCurrent")]
    pub spin_meter_current: Option<u32>,

    /// Symbols that landed and locked on this respin
    #[serde(default, alias = "newlyLockedSymbols")]
    pub newly_locked_symbols: Vec<LockedSymbolEntry>,

    /// Rewards, present on the terminal respin only
    #[serde(default)]
    pub rewards: Option<Vec<RawReward>>,
}

impl ReevaluationPayload {
    /// Decode from JSON text
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder: first payload of an activation
    pub fn starting(start_value: u32) -> Self {
        Self {
            spin_meter_start_value: Some(start_value),
            ..Default::default()
        }
    }

    /// Builder: set remaining respins
    pub fn with_remaining(mut self, remaining: u32) -> Self {
        self.spin_meter_current = Some(remaining);
        self
    }

    /// Builder: add a newly locked symbol
    pub fn with_lock(mut self, reel_index: usize, slot_position: usize, symbol: &str) -> Self {
        self.newly_locked_symbols.push(LockedSymbolEntry {
            reel_index,
            slot_position,
            resulting_symbol_name: symbol.to_string(),
        });
        self
    }

    /// Builder: add a reward entry
    pub fn with_reward(mut self, reward: RawReward) -> Self {
        self.rewards.get_or_insert_with(Vec::new).push(reward);
        self
    }
}

/// Symbol that locked on a respin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSymbolEntry {
    #[serde(alias = "reelIndex")]
    pub reel_index: usize,
    #[serde(alias = "slotPosition")]
    pub slot_position: usize,
    #[serde(alias = "resultingSymbolName")]
    pub resulting_symbol_name: String,
}

/// Reward entry as sent by the server, classified by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReward {
    /// Declared reward type (`symbol_credit`, `jackpot`, `bonus_game`, `end_reward`)
    pub outcome_type: String,

    #[serde(default)]
    pub reel_index: usize,

    #[serde(default)]
    pub slot_position: usize,

    /// Credit amount in base units (before the bet multiplier)
    #[serde(default, alias = "credit_amount")]
    pub amount: Option<u64>,

    /// Declared jackpot tier
    #[serde(default)]
    pub tier: Option<String>,

    /// Opaque nested bonus game descriptor
    #[serde(default)]
    pub bonus_payload: Option<serde_json::Value>,
}

impl RawReward {
    fn new(outcome_type: &str, reel_index: usize, slot_position: usize) -> Self {
        Self {
            outcome_type: outcome_type.to_string(),
            reel_index,
            slot_position,
            amount: None,
            tier: None,
            bonus_payload: None,
        }
    }

    /// `symbol_credit` entry
    pub fn credits(reel_index: usize, slot_position: usize, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::new("symbol_credit", reel_index, slot_position)
        }
    }

    /// `jackpot` entry
    pub fn jackpot(reel_index: usize, slot_position: usize, tier: &str, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            tier: Some(tier.to_string()),
            ..Self::new("jackpot", reel_index, slot_position)
        }
    }

    /// `bonus_game` entry
    pub fn bonus(reel_index: usize, slot_position: usize, payload: serde_json::Value) -> Self {
        Self {
            bonus_payload: Some(payload),
            ..Self::new("bonus_game", reel_index, slot_position)
        }
    }

    /// `end_reward` entry (ladder variant)
    pub fn end_reward(amount: Option<u64>) -> Self {
        Self {
            amount,
            ..Self::new("end_reward", 0, 0)
        }
    }

    /// Entry with an arbitrary outcome type
    pub fn other(outcome_type: &str) -> Self {
        Self::new(outcome_type, 0, 0)
    }
}

/// Separately queried progressive jackpot outcome (blackout variant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveJackpotWin {
    /// Authoritative jackpot value at award time
    pub running_total: u64,
}

/// Opaque nested bonus game descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BonusPayload(pub serde_json::Value);

impl BonusPayload {
    /// Bonus name if the descriptor carries one
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }
}

/// Payload decoding error
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
