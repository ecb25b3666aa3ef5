//! Stage Taxonomy — Enums for respin feature elements
//!
//! These enums classify the board layers, feature variants, jackpot tiers
//! and big win tiers that stages refer to.

use serde::{Deserialize, Serialize};

/// Big win tier classification
///
/// Standard tiers based on win-to-wager ratio:
/// - Win: below the big win threshold
/// - BigWin: 15-25x
/// - MegaWin: 25-50x
/// - EpicWin: 50-100x
/// - UltraWin: 100x+
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigWinTier {
    Win,
    BigWin,
    MegaWin,
    EpicWin,
    UltraWin,
}

impl BigWinTier {
    /// Get tier from win-to-wager ratio using the default thresholds
    pub fn from_ratio(ratio: f64) -> Self {
        Self::from_ratio_with(ratio, &BigWinThresholds::default())
    }

    /// Get tier from win-to-wager ratio using custom thresholds
    pub fn from_ratio_with(ratio: f64, thresholds: &BigWinThresholds) -> Self {
        match ratio {
            r if r >= thresholds.ultra_win => Self::UltraWin,
            r if r >= thresholds.epic_win => Self::EpicWin,
            r if r >= thresholds.mega_win => Self::MegaWin,
            r if r >= thresholds.big_win => Self::BigWin,
            _ => Self::Win,
        }
    }

    /// Whether this tier warrants a celebration
    pub fn is_big(&self) -> bool {
        *self >= Self::BigWin
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::BigWin => "BIG WIN",
            Self::MegaWin => "MEGA WIN",
            Self::EpicWin => "EPIC WIN",
            Self::UltraWin => "ULTRA WIN",
        }
    }
}

/// Wager ratios at which each big win tier starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigWinThresholds {
    pub big_win: f64,
    pub mega_win: f64,
    pub epic_win: f64,
    pub ultra_win: f64,
}

impl Default for BigWinThresholds {
    fn default() -> Self {
        Self {
            big_win: 15.0,
            mega_win: 25.0,
            epic_win: 50.0,
            ultra_win: 100.0,
        }
    }
}

/// Which respin feature variant a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureVariant {
    /// Fill the board to win the progressive jackpot
    Blackout,
    /// Trigger symbols climb a multiplier ladder
    Ladder,
}

impl FeatureVariant {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Blackout => "Blackout Respin",
            Self::Ladder => "Ladder Respin",
        }
    }
}

/// The two parallel board representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelLayer {
    /// Synchronized reels used in normal play
    #[default]
    Standard,
    /// One independently spinning reel per board slot
    Independent,
}

impl ReelLayer {
    /// The layer that is hidden while `self` is visible
    pub fn other(&self) -> Self {
        match self {
            Self::Standard => Self::Independent,
            Self::Independent => Self::Standard,
        }
    }

    /// Arena index of this layer
    pub fn index(&self) -> usize {
        match self {
            Self::Standard => 0,
            Self::Independent => 1,
        }
    }
}

/// Jackpot tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JackpotTier {
    Mini,
    Minor,
    Major,
    /// Server-accrued jackpot, awarded on blackout
    Progressive,
}

impl JackpotTier {
    /// Parse the tier name the server declares on a jackpot reward
    pub fn from_wire(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mini" => Some(Self::Mini),
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            "progressive" | "grand" => Some(Self::Progressive),
            _ => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mini => "MINI",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
            Self::Progressive => "PROGRESSIVE",
        }
    }

    /// Get tier level (for sorting)
    pub fn level(&self) -> u8 {
        match self {
            Self::Mini => 1,
            Self::Minor => 2,
            Self::Major => 3,
            Self::Progressive => 4,
        }
    }

    pub fn is_progressive(&self) -> bool {
        matches!(self, Self::Progressive)
    }
}

/// Slot position on a board layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolPosition {
    /// Reel index (0-based)
    pub reel: u8,
    /// Row index (0-based, 0 = top)
    pub row: u8,
}

impl SymbolPosition {
    pub fn new(reel: u8, row: u8) -> Self {
        Self { reel, row }
    }
}
