//! Scenario System — scripted feature activations
//!
//! A scenario fixes everything the server would send for one activation:
//! the triggering standard spin, the ordered reevaluation payloads, the
//! progressive jackpot answer and the nested bonus games' payouts. Playing it
//! drives a `FeatureSession` over a `RecordingHost`.
//!
//! ## Built-in Presets
//!
//! - `blackout_demo` — board fills, every reward kind including a progressive
//! - `ladder_demo` — ladder tiers climb, end reward pays the top tier

mod presets;

pub use presets::*;

use std::path::Path;

use rf_stage::{StageTrace, TraceSummary};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, RespinConfig};
use crate::host::{CreditCommit, RecordingHost};
use crate::payload::{ProgressiveJackpotWin, ReevaluationPayload};
use crate::session::{FeatureSession, ReevaluationOutcome, ResolutionSummary, SessionSnapshot};

/// One scripted activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario ID
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_wager")]
    pub wager: u64,
    #[serde(default = "default_bet_multiplier")]
    pub bet_multiplier: u64,
    /// Standard spin result as `[reel][row]`
    pub standard_grid: Vec<Vec<String>>,
    /// Reevaluation payloads in arrival order
    #[serde(default)]
    pub reevaluations: Vec<ReevaluationPayload>,
    /// Server progressive jackpot answer
    #[serde(default)]
    pub progressive: Option<ProgressiveJackpotWin>,
    /// Final payouts the nested bonus games report, in call order
    #[serde(default)]
    pub bonus_payouts: Vec<u64>,
}

fn default_wager() -> u64 {
    1
}

fn default_bet_multiplier() -> u64 {
    1
}

impl Scenario {
    /// Parse from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ScenarioError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioOutcome {
    /// Standard spin did not trigger the feature
    NotTriggered,
    /// Payloads ran out before the respins finished
    Unfinished,
    /// Activation resolved and exited
    Resolved,
}

/// Result of one reevaluation within a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepRecord {
    Ignored,
    Continue { remaining: u32 },
    Resolved { total: u64 },
}

/// Everything observed while playing a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario_id: String,
    pub outcome: ScenarioOutcome,
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionSummary>,
    pub commits: Vec<CreditCommit>,
    pub committed_total: u64,
    pub snapshot: SessionSnapshot,
    pub summary: TraceSummary,
    pub trace: StageTrace,
}

/// Play a scenario on the current task
pub async fn play_scenario(
    config: RespinConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, ScenarioError> {
    let host = RecordingHost::new(config.game_id.clone())
        .with_bonus_payouts(scenario.bonus_payouts.iter().copied())
        .with_progressive(scenario.progressive);
    let mut session = FeatureSession::new(config, host)?;
    session.set_bet_multiplier(scenario.bet_multiplier);
    session.on_wager_changed(scenario.wager);
    session.begin_round();

    log::info!("playing scenario '{}'", scenario.id);

    let mut steps = Vec::new();
    let mut resolution = None;
    let outcome = if !session.on_standard_spin(&scenario.standard_grid).await {
        ScenarioOutcome::NotTriggered
    } else {
        for (index, payload) in scenario.reevaluations.iter().enumerate() {
            if resolution.is_some() {
                log::warn!(
                    "scenario '{}': {} payloads after resolution ignored",
                    scenario.id,
                    scenario.reevaluations.len() - index
                );
                break;
            }
            let step = match session.on_reevaluation(payload).await {
                ReevaluationOutcome::Ignored => StepRecord::Ignored,
                ReevaluationOutcome::Continue { remaining } => StepRecord::Continue { remaining },
                ReevaluationOutcome::Resolved(summary) => {
                    let total = summary.activation_total;
                    resolution = Some(summary);
                    StepRecord::Resolved { total }
                }
            };
            steps.push(step);
        }
        if resolution.is_some() {
            ScenarioOutcome::Resolved
        } else {
            log::warn!("scenario '{}' ended before the respins finished", scenario.id);
            ScenarioOutcome::Unfinished
        }
    };

    let snapshot = session.snapshot();
    let host = session.into_host();
    let trace = host
        .trace
        .with_session(scenario.id.clone())
        .with_metadata("wager", serde_json::json!(scenario.wager))
        .with_metadata("bet_multiplier", serde_json::json!(scenario.bet_multiplier));
    Ok(ScenarioReport {
        scenario_id: scenario.id.clone(),
        outcome,
        steps,
        resolution,
        committed_total: host.commits.iter().map(|c| c.amount).sum(),
        commits: host.commits,
        snapshot,
        summary: trace.summary(),
        trace,
    })
}

/// Play a scenario on a fresh current-thread runtime
pub fn run_scenario(
    config: RespinConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, ScenarioError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(ScenarioError::Runtime)?;
    runtime.block_on(play_scenario(config, scenario))
}

/// Scenario loading and playback error
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported scenario format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
