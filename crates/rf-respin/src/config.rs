//! Respin feature configuration

use std::collections::HashMap;
use std::path::Path;

use rf_stage::{BigWinThresholds, FeatureVariant, JackpotTier};
use serde::{Deserialize, Serialize};

use crate::ledger::RewardKind;
use crate::timing::RollupDuration;

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Total board slots
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }

    /// Whether `(reel, row)` lies on the board
    pub fn contains(&self, reel: usize, row: usize) -> bool {
        reel < self.reels as usize && row < self.rows as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// Rollup timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Duration override (0 = auto, -1 = skip, >0 = seconds)
    #[serde(default)]
    pub duration: RollupDuration,
    /// Credits per second when the duration is auto-computed
    #[serde(default = "default_rollup_speed")]
    pub speed: f64,
    /// Shortest auto-computed rollup
    #[serde(default = "default_min_seconds")]
    pub min_seconds: f64,
    /// Longest auto-computed rollup
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,
}

fn default_rollup_speed() -> f64 {
    50.0
}

fn default_min_seconds() -> f64 {
    0.5
}

fn default_max_seconds() -> f64 {
    10.0
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            duration: RollupDuration::Auto,
            speed: default_rollup_speed(),
            min_seconds: default_min_seconds(),
            max_seconds: default_max_seconds(),
        }
    }
}

/// Loop and end cue played around one rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundPair {
    pub loop_cue: String,
    pub end_cue: String,
}

impl SoundPair {
    pub fn new(loop_cue: impl Into<String>, end_cue: impl Into<String>) -> Self {
        Self {
            loop_cue: loop_cue.into(),
            end_cue: end_cue.into(),
        }
    }
}

/// Rollup cue pair per reward category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupSounds {
    pub credits: SoundPair,
    pub jackpot: SoundPair,
    pub progressive: SoundPair,
    pub bonus: SoundPair,
}

impl RollupSounds {
    /// Cue pair owned by a reward category
    pub fn for_kind(&self, kind: RewardKind) -> &SoundPair {
        match kind {
            RewardKind::Credits => &self.credits,
            RewardKind::Jackpot => &self.jackpot,
            RewardKind::ProgressiveJackpot => &self.progressive,
            RewardKind::Bonus => &self.bonus,
        }
    }
}

impl Default for RollupSounds {
    fn default() -> Self {
        Self {
            credits: SoundPair::new("rollup_credits_loop", "rollup_credits_end"),
            jackpot: SoundPair::new("rollup_jackpot_loop", "rollup_jackpot_end"),
            progressive: SoundPair::new("rollup_progressive_loop", "rollup_progressive_end"),
            bonus: SoundPair::new("rollup_bonus_loop", "rollup_bonus_end"),
        }
    }
}

/// Presentation set per jackpot tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JackpotPresentations {
    pub mini: String,
    pub minor: String,
    pub major: String,
    pub progressive: String,
}

impl JackpotPresentations {
    pub fn for_tier(&self, tier: JackpotTier) -> &str {
        match tier {
            JackpotTier::Mini => &self.mini,
            JackpotTier::Minor => &self.minor,
            JackpotTier::Major => &self.major,
            JackpotTier::Progressive => &self.progressive,
        }
    }
}

impl Default for JackpotPresentations {
    fn default() -> Self {
        Self {
            mini: "jackpot_mini".to_string(),
            minor: "jackpot_minor".to_string(),
            major: "jackpot_major".to_string(),
            progressive: "jackpot_progressive".to_string(),
        }
    }
}

/// Presentation sets played around a nested bonus game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusTransitions {
    pub transition_out: String,
    pub transition_in: String,
}

impl Default for BonusTransitions {
    fn default() -> Self {
        Self {
            transition_out: "bonus_fade_out".to_string(),
            transition_in: "bonus_fade_in".to_string(),
        }
    }
}

/// One row of a ladder table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderTierSpec {
    /// Cumulative locked trigger symbols needed to unlock the tier
    pub threshold: u32,
    /// Wager multiplier paid by the tier
    pub multiplier: u64,
}

impl LadderTierSpec {
    pub fn new(threshold: u32, multiplier: u64) -> Self {
        Self {
            threshold,
            multiplier,
        }
    }
}

/// Complete respin feature configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespinConfig {
    /// Game identifier, keys the ladder table
    pub game_id: String,

    /// Feature variant
    pub variant: FeatureVariant,

    /// Board dimensions
    #[serde(default)]
    pub grid: GridSpec,

    /// Symbols that trigger the feature and lock on entry
    pub trigger_symbols: Vec<String>,

    /// Minimum trigger symbols on a standard spin to start the feature
    #[serde(default = "default_trigger_count")]
    pub trigger_count: u8,

    /// Respins used when the first payload carries no start value
    #[serde(default = "default_respins")]
    pub default_respins: u32,

    #[serde(default)]
    pub rollup: RollupConfig,

    #[serde(default)]
    pub rollup_sounds: RollupSounds,

    #[serde(default)]
    pub jackpot_presentations: JackpotPresentations,

    #[serde(default)]
    pub bonus_transitions: BonusTransitions,

    /// Ladder tables keyed by game id
    #[serde(default)]
    pub ladder_tables: HashMap<String, Vec<LadderTierSpec>>,

    /// Big win thresholds (wager ratios)
    #[serde(default)]
    pub win_tiers: BigWinThresholds,

    /// Reason attached to every credit commit
    #[serde(default = "default_feature_name")]
    pub feature_name: String,
}

fn default_trigger_count() -> u8 {
    6
}

fn default_respins() -> u32 {
    3
}

fn default_feature_name() -> String {
    "stick_and_win".to_string()
}

impl RespinConfig {
    /// Blackout variant on a 5×3 board
    pub fn blackout(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            variant: FeatureVariant::Blackout,
            grid: GridSpec::standard_5x3(),
            trigger_symbols: vec!["COIN".to_string()],
            trigger_count: default_trigger_count(),
            default_respins: default_respins(),
            rollup: RollupConfig::default(),
            rollup_sounds: RollupSounds::default(),
            jackpot_presentations: JackpotPresentations::default(),
            bonus_transitions: BonusTransitions::default(),
            ladder_tables: HashMap::new(),
            win_tiers: BigWinThresholds::default(),
            feature_name: default_feature_name(),
        }
    }

    /// Ladder variant on a 5×3 board with the given tier table
    pub fn ladder(game_id: impl Into<String>, tiers: Vec<LadderTierSpec>) -> Self {
        let game_id = game_id.into();
        let mut config = Self::blackout(game_id.clone());
        config.variant = FeatureVariant::Ladder;
        config.trigger_count = 3;
        config.ladder_tables.insert(game_id, tiers);
        config
    }

    /// Builder: set grid
    pub fn with_grid(mut self, reels: u8, rows: u8) -> Self {
        self.grid = GridSpec { reels, rows };
        self
    }

    /// Builder: set rollup duration override
    pub fn with_rollup_duration(mut self, duration: RollupDuration) -> Self {
        self.rollup.duration = duration;
        self
    }

    /// Builder: set trigger count
    pub fn with_trigger_count(mut self, count: u8) -> Self {
        self.trigger_count = count;
        self
    }

    /// Ladder table for the configured game, if any
    pub fn ladder_table(&self) -> Option<&[LadderTierSpec]> {
        self.ladder_tables.get(&self.game_id).map(Vec::as_slice)
    }

    /// Whether a symbol name is one of the trigger symbols
    pub fn is_trigger_symbol(&self, name: &str) -> bool {
        self.trigger_symbols.iter().any(|s| s == name)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.total_positions() == 0 {
            return Err(ConfigError::InvalidValue("grid has no slots".to_string()));
        }
        if self.trigger_symbols.is_empty() {
            return Err(ConfigError::MissingParam("trigger_symbols".to_string()));
        }
        if self.trigger_count as usize > self.grid.total_positions() {
            return Err(ConfigError::InvalidValue(format!(
                "trigger_count {} exceeds {} board slots",
                self.trigger_count,
                self.grid.total_positions()
            )));
        }
        validate_rollup(&self.rollup)?;
        if self.variant == FeatureVariant::Ladder {
            let table = self.ladder_table().ok_or_else(|| {
                ConfigError::MissingParam(format!("ladder table for '{}'", self.game_id))
            })?;
            validate_ladder_table(table)?;
        }
        Ok(())
    }

    /// Parse from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Default for RespinConfig {
    fn default() -> Self {
        Self::blackout("default")
    }
}

/// Rollup speed positive, bounds finite, non-negative and ordered
pub fn validate_rollup(rollup: &RollupConfig) -> Result<(), ConfigError> {
    if !(rollup.speed.is_finite() && rollup.speed > 0.0) {
        return Err(ConfigError::InvalidValue(
            "rollup speed must be positive".to_string(),
        ));
    }
    let bounds = [
        ("min_seconds", rollup.min_seconds),
        ("max_seconds", rollup.max_seconds),
    ];
    for (name, value) in bounds {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "rollup {} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if rollup.min_seconds > rollup.max_seconds {
        return Err(ConfigError::InvalidValue(format!(
            "rollup min_seconds {} exceeds max_seconds {}",
            rollup.min_seconds, rollup.max_seconds
        )));
    }
    Ok(())
}

/// Thresholds must be strictly increasing by tier index
pub fn validate_ladder_table(table: &[LadderTierSpec]) -> Result<(), ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::InvalidValue("ladder table is empty".to_string()));
    }
    for pair in table.windows(2) {
        if pair[1].threshold <= pair[0].threshold {
            return Err(ConfigError::InvalidValue(format!(
                "ladder thresholds not strictly increasing: {} then {}",
                pair[0].threshold, pair[1].threshold
            )));
        }
    }
    Ok(())
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("Invalid parameter value: {0}")]
    InvalidValue(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}
