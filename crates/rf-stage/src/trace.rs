//! StageTrace — A complete sequence of stage events for one feature activation
//!
//! A trace captures the full timeline a session asked its collaborators to play.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::{Stage, StageCategory};
use crate::taxonomy::{BigWinTier, FeatureVariant};

/// A complete trace of stage events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Game identifier
    pub game_id: String,

    /// Optional session identifier
    #[serde(default)]
    pub session_id: Option<String>,

    /// All events in chronological order
    pub events: Vec<StageEvent>,

    /// When this trace was recorded
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            game_id: game_id.into(),
            session_id: None,
            events: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Add an event to the trace
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Set session ID
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        let first = self.events.first().map(|e| e.timestamp_ms).unwrap_or(0.0);
        let last = self.events.last().map(|e| e.timestamp_ms).unwrap_or(0.0);
        last - first
    }

    /// Get events by category
    pub fn events_by_category(&self, category: StageCategory) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.category() == category)
            .collect()
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.type_name() == type_name)
            .collect()
    }

    /// Check if trace contains a stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.type_name() == type_name)
    }

    /// Total reported on feature exit (0 if the feature never exited)
    pub fn total_win(&self) -> u64 {
        self.events
            .iter()
            .rev()
            .find_map(|e| match &e.stage {
                Stage::FeatureExit { total_win } => Some(*total_win),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Get max big win tier reached
    pub fn max_bigwin_tier(&self) -> Option<BigWinTier> {
        self.events
            .iter()
            .filter_map(|e| match &e.stage {
                Stage::BigWin { tier, .. } => Some(*tier),
                _ => None,
            })
            .max()
    }

    /// Check if trace has a feature activation
    pub fn has_feature(&self) -> bool {
        self.has_stage("feature_enter")
    }

    /// Check if any jackpot was presented
    pub fn has_jackpot(&self) -> bool {
        self.has_stage("jackpot_present")
    }

    /// Variant of the activation in this trace
    pub fn feature_variant(&self) -> Option<FeatureVariant> {
        self.events.iter().find_map(|e| match &e.stage {
            Stage::FeatureEnter { variant, .. } => Some(*variant),
            _ => None,
        })
    }

    /// Validate pairing of the trace's bracketed stages
    pub fn validate(&self) -> TraceValidation {
        let count = |name: &str| self.events_by_type(name).len();

        TraceValidation {
            has_feature_enter: self.has_feature(),
            has_feature_exit: self.has_stage("feature_exit"),
            rollups_balanced: count("rollup_start") == count("rollup_end"),
            bonus_transitions_balanced: count("bonus_transition_out")
                == count("bonus_transition_in"),
            loops_balanced: self.events.iter().filter(|e| e.stage.is_looping()).count()
                == count("symbol_loop_stop"),
        }
    }

    /// Get summary of trace
    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            trace_id: self.trace_id.clone(),
            game_id: self.game_id.clone(),
            event_count: self.events.len(),
            duration_ms: self.duration_ms(),
            total_win: self.total_win(),
            has_feature: self.has_feature(),
            has_jackpot: self.has_jackpot(),
            max_bigwin_tier: self.max_bigwin_tier(),
        }
    }
}

/// Validation result for a trace
#[derive(Debug, Clone, Default)]
pub struct TraceValidation {
    pub has_feature_enter: bool,
    pub has_feature_exit: bool,
    pub rollups_balanced: bool,
    pub bonus_transitions_balanced: bool,
    pub loops_balanced: bool,
}

impl TraceValidation {
    /// Check if trace is valid (has all required elements)
    pub fn is_valid(&self) -> bool {
        self.has_feature_enter
            && self.has_feature_exit
            && self.rollups_balanced
            && self.bonus_transitions_balanced
            && self.loops_balanced
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if !self.has_feature_enter {
            warnings.push("Missing FEATURE_ENTER event");
        }
        if self.has_feature_enter && !self.has_feature_exit {
            warnings.push("Feature entered but not exited");
        }
        if !self.rollups_balanced {
            warnings.push("Rollup started without ending");
        }
        if !self.bonus_transitions_balanced {
            warnings.push("Bonus transition out without transition in");
        }
        if !self.loops_balanced {
            warnings.push("Symbol loop left running");
        }

        warnings
    }
}

/// Summary of a trace for quick overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub game_id: String,
    pub event_count: usize,
    pub duration_ms: f64,
    pub total_win: u64,
    pub has_feature: bool,
    pub has_jackpot: bool,
    pub max_bigwin_tier: Option<BigWinTier>,
}
