//! Collaborator interfaces the engine calls into
//!
//! Presentation, audio, the economy ledger, the nested bonus game host and
//! the server's progressive jackpot query are external services. Every
//! awaited method is a suspension point; nothing else in the engine blocks.

use std::collections::VecDeque;

use rf_stage::{Stage, StageEvent, StageTrace};
use serde::{Deserialize, Serialize};

use crate::payload::{BonusPayload, ProgressiveJackpotWin};
use crate::timing::Timeline;

/// Plays stages
#[allow(async_fn_in_trait)]
pub trait Presenter {
    /// Play a stage and resolve when its presentation completes
    async fn present(&mut self, event: StageEvent);

    /// Start or stop a presentation without waiting (loops, state cues)
    fn cue(&mut self, event: StageEvent);
}

/// Plays sound cues, fire-and-forget
pub trait AudioSink {
    fn play_sound(&mut self, cue: &str);
}

/// Persistent player balance, fire-and-forget
pub trait Economy {
    fn commit_credits(&mut self, amount: u64, reason: &str);
}

/// Final result reported by a nested bonus game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusOutcome {
    pub final_payout: u64,
}

/// Runs nested bonus games
#[allow(async_fn_in_trait)]
pub trait BonusHost {
    /// Hand control to the bonus game; resolves when it signals completion
    async fn run_bonus(&mut self, payload: &BonusPayload) -> BonusOutcome;
}

/// Server query for the authoritative progressive jackpot value
#[allow(async_fn_in_trait)]
pub trait ProgressiveSource {
    async fn progressive_jackpot_win(&mut self) -> Option<ProgressiveJackpotWin>;
}

/// Every collaborator a feature session needs
pub trait FeatureHost: Presenter + AudioSink + Economy + BonusHost + ProgressiveSource {}

impl<T> FeatureHost for T where T: Presenter + AudioSink + Economy + BonusHost + ProgressiveSource {}

/// Present a stage stamped on the timeline and await it
pub(crate) async fn present_stage<H: Presenter>(
    host: &mut H,
    timeline: &mut Timeline,
    stage: Stage,
    presentation: Option<&str>,
) {
    let event = StageEvent::new(stage, timeline.step()).with_presentation_opt(presentation);
    host.present(event).await;
}

/// Cue a stage stamped on the timeline without waiting
pub(crate) fn cue_stage<H: Presenter>(host: &mut H, timeline: &mut Timeline, stage: Stage) {
    let event = StageEvent::new(stage, timeline.step());
    host.cue(event);
}

/// Tag on trace events that were cued rather than awaited
pub const CUE_TAG: &str = "cue";

/// One economy commit observed by `RecordingHost`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCommit {
    pub amount: u64,
    pub reason: String,
}

/// Host that records every call, used by scenarios and tests
///
/// Awaited presentations yield to the scheduler once, so other tasks on the
/// same thread observe the session mid-flight. Cued stages carry the
/// [`CUE_TAG`] tag.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    pub trace: StageTrace,
    pub commits: Vec<CreditCommit>,
    pub bonus_calls: Vec<BonusPayload>,
    bonus_payouts: VecDeque<u64>,
    progressive: Option<ProgressiveJackpotWin>,
}

impl RecordingHost {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            trace: StageTrace::new("recording", game_id),
            commits: Vec::new(),
            bonus_calls: Vec::new(),
            bonus_payouts: VecDeque::new(),
            progressive: None,
        }
    }

    /// Builder: payouts the nested bonus games report, in call order
    pub fn with_bonus_payouts(mut self, payouts: impl IntoIterator<Item = u64>) -> Self {
        self.bonus_payouts.extend(payouts);
        self
    }

    /// Builder: server progressive jackpot answer
    pub fn with_progressive(mut self, win: Option<ProgressiveJackpotWin>) -> Self {
        self.progressive = win;
        self
    }

    /// Sum of committed credits
    pub fn committed_total(&self) -> u64 {
        self.commits.iter().map(|c| c.amount).sum()
    }

    /// Stage type names in presentation order, sounds excluded
    pub fn stage_sequence(&self) -> Vec<&'static str> {
        self.trace
            .events
            .iter()
            .filter(|e| !matches!(e.stage, Stage::Sound { .. }))
            .map(|e| e.type_name())
            .collect()
    }

    fn last_timestamp(&self) -> f64 {
        self.trace.events.last().map(|e| e.timestamp_ms).unwrap_or(0.0)
    }
}

impl Presenter for RecordingHost {
    async fn present(&mut self, event: StageEvent) {
        self.trace.push(event);
        tokio::task::yield_now().await;
    }

    fn cue(&mut self, event: StageEvent) {
        self.trace.push(event.with_tag(CUE_TAG));
    }
}

impl AudioSink for RecordingHost {
    fn play_sound(&mut self, cue: &str) {
        let timestamp = self.last_timestamp();
        self.trace.push(StageEvent::new(
            Stage::Sound {
                cue: cue.to_string(),
            },
            timestamp,
        ));
    }
}

impl Economy for RecordingHost {
    fn commit_credits(&mut self, amount: u64, reason: &str) {
        self.commits.push(CreditCommit {
            amount,
            reason: reason.to_string(),
        });
    }
}

impl BonusHost for RecordingHost {
    async fn run_bonus(&mut self, payload: &BonusPayload) -> BonusOutcome {
        self.bonus_calls.push(payload.clone());
        tokio::task::yield_now().await;
        let final_payout = self.bonus_payouts.pop_front().unwrap_or_else(|| {
            log::warn!("no scripted bonus payout left, reporting 0");
            0
        });
        BonusOutcome { final_payout }
    }
}

impl ProgressiveSource for RecordingHost {
    async fn progressive_jackpot_win(&mut self) -> Option<ProgressiveJackpotWin> {
        self.progressive
    }
}
