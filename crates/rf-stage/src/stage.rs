//! Stage — The core enum defining every presentation moment of a respin feature
//!
//! A Stage is NOT an animation and NOT a sound file.
//! A Stage is the SEMANTIC MEANING of a moment in the feature flow; the
//! presentation and audio collaborators decide how it looks and sounds.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{BigWinTier, FeatureVariant, JackpotTier, ReelLayer};

/// Canonical respin feature stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // FEATURE LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Trigger detected on a standard spin, feature starting
    FeatureEnter {
        variant: FeatureVariant,
        /// Trigger symbols locked on entry
        #[serde(default)]
        locked_count: u32,
    },

    /// One respin evaluated
    RespinStep {
        /// Respins left after this step
        remaining: u32,
        /// Slots locked so far
        #[serde(default)]
        locked_count: u32,
    },

    /// Every slot on the board is locked
    Blackout,

    /// Feature finished, board back on the standard layer
    FeatureExit {
        #[serde(default)]
        total_win: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // REEL LAYERS
    // ═══════════════════════════════════════════════════════════════════════
    /// Visible layer changed
    LayerSwap { layer: ReelLayer },

    // ═══════════════════════════════════════════════════════════════════════
    // SYMBOLS
    // ═══════════════════════════════════════════════════════════════════════
    /// Symbol landed and locked in place
    SymbolLock {
        reel_index: u8,
        row_index: u8,
        symbol: String,
    },

    /// Anticipation loop on a locked symbol
    SymbolLoopStart { reel_index: u8, row_index: u8 },

    /// Anticipation loop terminated
    SymbolLoopStop { reel_index: u8, row_index: u8 },

    /// Locked symbol without an individual reward settles to idle
    SymbolIdle { reel_index: u8, row_index: u8 },

    /// Locked symbol paying out its reward
    SymbolResolve { reel_index: u8, row_index: u8 },

    // ═══════════════════════════════════════════════════════════════════════
    // LADDER
    // ═══════════════════════════════════════════════════════════════════════
    /// Previously active ladder tier returns to idle
    LadderTierDeactivate { tier_index: u32 },

    /// Ladder tier unlocked
    LadderTierUnlock { tier_index: u32, credit_value: u64 },

    /// Displayed tier values recomputed for a new wager
    LadderValuesUpdate { wager: u64 },

    // ═══════════════════════════════════════════════════════════════════════
    // ROLLUP
    // ═══════════════════════════════════════════════════════════════════════
    /// Win counter counting up
    RollupStart {
        start_amount: u64,
        target_amount: u64,
        #[serde(default)]
        duration_ms: f64,
    },

    /// Win counter reached its target
    RollupEnd { final_amount: u64 },

    // ═══════════════════════════════════════════════════════════════════════
    // JACKPOT
    // ═══════════════════════════════════════════════════════════════════════
    /// Jackpot tier presentation
    JackpotPresent { tier: JackpotTier, amount: u64 },

    // ═══════════════════════════════════════════════════════════════════════
    // BONUS
    // ═══════════════════════════════════════════════════════════════════════
    /// Overlay fade and spin panel hide before the nested bonus game
    BonusTransitionOut,

    /// Nested bonus game handed control
    BonusEnter {
        #[serde(default)]
        bonus_name: Option<String>,
    },

    /// Nested bonus game signalled completion
    BonusExit {
        #[serde(default)]
        total_win: u64,
    },

    /// Overlay and spin panel restored after the nested bonus game
    BonusTransitionIn,

    // ═══════════════════════════════════════════════════════════════════════
    // WIN / AUDIO
    // ═══════════════════════════════════════════════════════════════════════
    /// Big win celebration for the activation total
    BigWin { tier: BigWinTier, amount: u64 },

    /// Sound cue
    Sound { cue: String },
}

impl Stage {
    /// Get the category of this stage
    pub fn category(&self) -> StageCategory {
        match self {
            Stage::FeatureEnter { .. }
            | Stage::RespinStep { .. }
            | Stage::Blackout
            | Stage::FeatureExit { .. } => StageCategory::Feature,
            Stage::LayerSwap { .. } => StageCategory::Layer,
            Stage::SymbolLock { .. }
            | Stage::SymbolLoopStart { .. }
            | Stage::SymbolLoopStop { .. }
            | Stage::SymbolIdle { .. }
            | Stage::SymbolResolve { .. } => StageCategory::Symbol,
            Stage::LadderTierDeactivate { .. }
            | Stage::LadderTierUnlock { .. }
            | Stage::LadderValuesUpdate { .. } => StageCategory::Ladder,
            Stage::RollupStart { .. } | Stage::RollupEnd { .. } | Stage::BigWin { .. } => {
                StageCategory::WinLifecycle
            }
            Stage::JackpotPresent { .. } => StageCategory::Jackpot,
            Stage::BonusTransitionOut
            | Stage::BonusEnter { .. }
            | Stage::BonusExit { .. }
            | Stage::BonusTransitionIn => StageCategory::Bonus,
            Stage::Sound { .. } => StageCategory::Audio,
        }
    }

    /// Get the type name (for matching / logging)
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::FeatureEnter { .. } => "feature_enter",
            Stage::RespinStep { .. } => "respin_step",
            Stage::Blackout => "blackout",
            Stage::FeatureExit { .. } => "feature_exit",
            Stage::LayerSwap { .. } => "layer_swap",
            Stage::SymbolLock { .. } => "symbol_lock",
            Stage::SymbolLoopStart { .. } => "symbol_loop_start",
            Stage::SymbolLoopStop { .. } => "symbol_loop_stop",
            Stage::SymbolIdle { .. } => "symbol_idle",
            Stage::SymbolResolve { .. } => "symbol_resolve",
            Stage::LadderTierDeactivate { .. } => "ladder_tier_deactivate",
            Stage::LadderTierUnlock { .. } => "ladder_tier_unlock",
            Stage::LadderValuesUpdate { .. } => "ladder_values_update",
            Stage::RollupStart { .. } => "rollup_start",
            Stage::RollupEnd { .. } => "rollup_end",
            Stage::JackpotPresent { .. } => "jackpot_present",
            Stage::BonusTransitionOut => "bonus_transition_out",
            Stage::BonusEnter { .. } => "bonus_enter",
            Stage::BonusExit { .. } => "bonus_exit",
            Stage::BonusTransitionIn => "bonus_transition_in",
            Stage::BigWin { .. } => "big_win",
            Stage::Sound { .. } => "sound",
        }
    }

    /// Check if this is a looping stage (runs until explicitly stopped)
    pub fn is_looping(&self) -> bool {
        matches!(self, Stage::SymbolLoopStart { .. })
    }

    /// Get all valid stage type names for validation
    pub fn all_type_names() -> &'static [&'static str] {
        &[
            "feature_enter",
            "respin_step",
            "blackout",
            "feature_exit",
            "layer_swap",
            "symbol_lock",
            "symbol_loop_start",
            "symbol_loop_stop",
            "symbol_idle",
            "symbol_resolve",
            "ladder_tier_deactivate",
            "ladder_tier_unlock",
            "ladder_values_update",
            "rollup_start",
            "rollup_end",
            "jackpot_present",
            "bonus_transition_out",
            "bonus_enter",
            "bonus_exit",
            "bonus_transition_in",
            "big_win",
            "sound",
        ]
    }

    /// Check if a type name is valid
    pub fn is_valid_type_name(name: &str) -> bool {
        Self::all_type_names().contains(&name.to_lowercase().as_str())
    }
}

/// Stage category for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    Feature,
    Layer,
    Symbol,
    Ladder,
    WinLifecycle,
    Jackpot,
    Bonus,
    Audio,
}

impl StageCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::Layer => "Reel Layers",
            Self::Symbol => "Symbols",
            Self::Ladder => "Ladder",
            Self::WinLifecycle => "Win Lifecycle",
            Self::Jackpot => "Jackpot",
            Self::Bonus => "Bonus Games",
            Self::Audio => "Audio",
        }
    }
}
