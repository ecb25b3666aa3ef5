//! Feature Session — one Stick-and-Win activation from trigger to exit

use rf_stage::{BigWinTier, FeatureVariant, ReelLayer, Stage, SymbolPosition};
use serde::{Deserialize, Serialize};

use crate::board::{LayerChange, ReelLayerController};
use crate::budget::SpinBudget;
use crate::config::{ConfigError, RespinConfig};
use crate::host::{FeatureHost, cue_stage, present_stage};
use crate::ladder::LadderProgression;
use crate::ledger::{LedgerContext, RewardLedger};
use crate::payload::ReevaluationPayload;
use crate::sequencer::{PayoutReport, PayoutSequencer};
use crate::round::RoundGate;
use crate::symbols::{LockOutcome, LockState};
use crate::timing::Timeline;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No activation, standard layer visible
    #[default]
    Idle,
    /// Independent layer visible, awaiting reevaluations
    Respinning,
    /// Draining the reward ledger
    Resolving,
}

/// What a reevaluation payload did
#[derive(Debug, Clone, PartialEq)]
pub enum ReevaluationOutcome {
    /// No activation was running
    Ignored,
    /// Budget left and board not full
    Continue { remaining: u32 },
    /// Respins finished and every reward paid
    Resolved(ResolutionSummary),
}

/// Result of one activation's resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub payout: PayoutReport,
    /// Cumulative total accrued during the activation
    pub activation_total: u64,
    pub blackout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_win: Option<BigWinTier>,
}

/// Serialisable view of session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub active_layer: ReelLayer,
    pub budget: SpinBudget,
    pub locked_slots: usize,
    pub ladder_tier: Option<usize>,
    pub trigger_count: u32,
    pub running_total: u64,
    pub wager: u64,
    pub bet_multiplier: u64,
}

/// Drives the board, budget, ladder and payout sequencer for a host
///
/// Every per-activation flag lives here and is cleared on exit, so nothing
/// leaks from one activation into the next.
pub struct FeatureSession<H: FeatureHost> {
    config: RespinConfig,
    host: H,
    board: ReelLayerController,
    budget: SpinBudget,
    ladder: Option<LadderProgression>,
    gate: RoundGate,
    timeline: Timeline,
    phase: SessionPhase,
    wager: u64,
    bet_multiplier: u64,
    trigger_count: u32,
    activation_total: u64,
}

impl<H: FeatureHost> FeatureSession<H> {
    /// Create a session for a validated configuration
    pub fn new(config: RespinConfig, host: H) -> Result<Self, ConfigError> {
        config.validate()?;

        let ladder = match config.variant {
            FeatureVariant::Ladder => {
                let table = config.ladder_table().ok_or_else(|| {
                    ConfigError::MissingParam(format!("ladder table for '{}'", config.game_id))
                })?;
                Some(LadderProgression::new(table, 1)?)
            }
            FeatureVariant::Blackout => None,
        };

        let board = ReelLayerController::new(config.grid, config.trigger_symbols.clone());
        let budget = SpinBudget::new(config.grid.total_positions());

        Ok(Self {
            config,
            host,
            board,
            budget,
            ladder,
            gate: RoundGate::new(),
            timeline: Timeline::default(),
            phase: SessionPhase::Idle,
            wager: 1,
            bet_multiplier: 1,
            trigger_count: 0,
            activation_total: 0,
        })
    }

    /// Builder: share the host's round gate
    pub fn with_round_gate(mut self, gate: RoundGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> &RespinConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn board(&self) -> &ReelLayerController {
        &self.board
    }

    pub fn budget(&self) -> &SpinBudget {
        &self.budget
    }

    pub fn ladder(&self) -> Option<&LadderProgression> {
        self.ladder.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn wager(&self) -> u64 {
        self.wager
    }

    /// Handle to the round gate for spin-completion logic
    pub fn round_gate(&self) -> RoundGate {
        self.gate.clone()
    }

    pub fn is_resolving_rewards(&self) -> bool {
        self.gate.is_resolving()
    }

    /// Whether the surrounding round may end now
    pub fn can_round_end(&self) -> bool {
        self.gate.can_round_end() && self.phase == SessionPhase::Idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            active_layer: self.board.active_layer(),
            budget: self.budget.clone(),
            locked_slots: self.board.locked_count(),
            ladder_tier: self.ladder.as_ref().and_then(LadderProgression::active_tier),
            trigger_count: self.trigger_count,
            running_total: self.gate.running_total(),
            wager: self.wager,
            bet_multiplier: self.bet_multiplier,
        }
    }

    /// Multiplier applied to server base-unit amounts
    pub fn set_bet_multiplier(&mut self, bet_multiplier: u64) {
        self.bet_multiplier = bet_multiplier;
    }

    /// New wager: ladder tier values are recomputed, the active tier kept
    pub fn on_wager_changed(&mut self, wager: u64) {
        self.wager = wager;
        if let Some(ladder) = self.ladder.as_mut() {
            ladder.on_wager_changed(wager);
            cue_stage(
                &mut self.host,
                &mut self.timeline,
                Stage::LadderValuesUpdate { wager },
            );
        }
    }

    /// Start of a base or free-spin round
    pub fn begin_round(&mut self) {
        if self.phase != SessionPhase::Idle {
            log::warn!("begin_round during an activation ignored");
            return;
        }
        self.budget.reset();
        self.gate.reset_total();
    }

    /// Apply a standard spin result (`symbols[reel][row]`)
    ///
    /// Enters the feature when the board shows at least `trigger_count`
    /// trigger symbols. Returns whether an activation started.
    pub async fn on_standard_spin(&mut self, symbols: &[Vec<String>]) -> bool {
        if self.phase != SessionPhase::Idle {
            log::warn!("standard spin result during an activation ignored");
            return false;
        }
        self.board.load_standard(symbols);

        let rows = self.config.grid.rows as usize;
        let triggers = symbols
            .iter()
            .take(self.config.grid.reels as usize)
            .flat_map(|reel| reel.iter().take(rows))
            .filter(|name| self.config.is_trigger_symbol(name))
            .count();
        if triggers < self.config.trigger_count as usize {
            return false;
        }

        self.enter_feature().await;
        true
    }

    async fn enter_feature(&mut self) {
        self.timeline.reset();
        self.budget.reset();
        self.activation_total = 0;
        self.trigger_count = 0;
        if let Some(ladder) = self.ladder.as_mut() {
            ladder.reset();
        }

        let seeded = match self.board.activate(ReelLayer::Independent) {
            LayerChange::Swapped { seeded, .. } => seeded,
            LayerChange::Unchanged => Vec::new(),
        };
        self.phase = SessionPhase::Respinning;
        log::info!(
            "{} feature entered with {} locked symbols",
            self.config.variant.display_name(),
            seeded.len()
        );

        self.present(Stage::FeatureEnter {
            variant: self.config.variant,
            locked_count: seeded.len() as u32,
        })
        .await;
        self.present(Stage::LayerSwap {
            layer: ReelLayer::Independent,
        })
        .await;

        for symbol in &seeded {
            self.announce_lock(symbol.position, &symbol.symbol).await;
        }
        self.budget.record_locked(seeded.len());
        self.trigger_count = seeded.len() as u32;
        self.update_ladder().await;
    }

    /// Apply one respin's server outcome
    ///
    /// Resolves every reward once the budget is exhausted or the board is
    /// fully locked, whichever comes first.
    pub async fn on_reevaluation(&mut self, payload: &ReevaluationPayload) -> ReevaluationOutcome {
        if self.phase != SessionPhase::Respinning {
            log::warn!("reevaluation payload without an active feature ignored");
            return ReevaluationOutcome::Ignored;
        }

        if !self.budget.is_initialized() {
            let start = payload.spin_meter_start_value.unwrap_or_else(|| {
                log::warn!(
                    "first reevaluation without spin meter start value, using {}",
                    self.config.default_respins
                );
                self.config.default_respins
            });
            self.budget.initialize(start);
        }

        let mut newly_locked = 0;
        for entry in &payload.newly_locked_symbols {
            let name = &entry.resulting_symbol_name;
            match self.board.lock_symbol(entry.reel_index, entry.slot_position, name) {
                LockOutcome::Locked => {
                    newly_locked += 1;
                    if self.config.is_trigger_symbol(name) {
                        self.trigger_count += 1;
                    }
                    let position = SymbolPosition::new(
                        entry.reel_index as u8,
                        entry.slot_position as u8,
                    );
                    self.announce_lock(position, name).await;
                }
                LockOutcome::AlreadyLocked => log::warn!(
                    "slot ({}, {}) reported locked twice, ignored",
                    entry.reel_index,
                    entry.slot_position
                ),
                LockOutcome::OutOfBounds => log::warn!(
                    "locked symbol at ({}, {}) is off the board, ignored",
                    entry.reel_index,
                    entry.slot_position
                ),
            }
        }

        self.budget
            .on_reevaluation(payload.spin_meter_current, newly_locked);
        self.update_ladder().await;

        let remaining = self.budget.remaining();
        self.present(Stage::RespinStep {
            remaining,
            locked_count: self.board.locked_count() as u32,
        })
        .await;

        if !self.budget.respins_finished() {
            if payload.rewards.is_some() {
                log::warn!("rewards on a non-terminal respin ignored");
            }
            return ReevaluationOutcome::Continue { remaining };
        }

        ReevaluationOutcome::Resolved(self.resolve(payload).await)
    }

    async fn resolve(&mut self, payload: &ReevaluationPayload) -> ResolutionSummary {
        // Spin-settle stays blocked from the blackout stage to the last commit
        let resolving = self.gate.begin_resolving();
        self.phase = SessionPhase::Resolving;
        let blackout = self.budget.is_blackout();
        if blackout {
            self.present(Stage::Blackout).await;
        }

        // Every anticipation loop ends before the first payout
        for position in self.board.stop_all_loops() {
            self.cue(Stage::SymbolLoopStop {
                reel_index: position.reel,
                row_index: position.row,
            });
        }

        let rewards = match payload.rewards.as_deref() {
            Some(rewards) => rewards,
            None => {
                log::warn!("terminal reevaluation without rewards, resolving nothing");
                &[]
            }
        };
        let ctx = LedgerContext::new(self.bet_multiplier, self.config.variant)
            .with_ladder_credit(self.ladder.as_ref().and_then(LadderProgression::active_credit_value))
            .with_blackout(blackout);
        let ledger = RewardLedger::parse(rewards, &ctx);

        for position in self.board.positions_in_state(LockState::LockedLooping) {
            let (reel, row) = (position.reel as usize, position.row as usize);
            if !ledger.owns_reward(reel, row) {
                self.board.resolve_slot(reel, row);
                self.cue(Stage::SymbolIdle {
                    reel_index: position.reel,
                    row_index: position.row,
                });
            }
        }

        let payout = PayoutSequencer::new(
            &mut self.host,
            &mut self.board,
            &mut self.timeline,
            &self.config,
            &self.gate,
        )
        .resolve(&ledger, &resolving)
        .await;
        drop(resolving);
        self.activation_total = self.activation_total.saturating_add(payout.total);

        let big_win = self.celebrate().await;
        let activation_total = self.activation_total;
        self.exit_feature().await;

        ResolutionSummary {
            payout,
            activation_total,
            blackout,
            big_win,
        }
    }

    /// Big win stage for the activation total, at most once
    async fn celebrate(&mut self) -> Option<BigWinTier> {
        if self.wager == 0 || self.activation_total == 0 {
            return None;
        }
        let ratio = self.activation_total as f64 / self.wager as f64;
        let tier = BigWinTier::from_ratio_with(ratio, &self.config.win_tiers);
        if !tier.is_big() {
            return None;
        }
        self.present(Stage::BigWin {
            tier,
            amount: self.activation_total,
        })
        .await;
        Some(tier)
    }

    async fn exit_feature(&mut self) {
        if let LayerChange::Swapped { layer, .. } = self.board.activate(ReelLayer::Standard) {
            self.present(Stage::LayerSwap { layer }).await;
        }
        self.present(Stage::FeatureExit {
            total_win: self.activation_total,
        })
        .await;

        log::info!(
            "{} feature exited, total {}",
            self.config.variant.display_name(),
            self.activation_total
        );

        self.budget.reset();
        self.trigger_count = 0;
        if let Some(ladder) = self.ladder.as_mut() {
            ladder.reset();
        }
        self.phase = SessionPhase::Idle;
    }

    async fn announce_lock(&mut self, position: SymbolPosition, symbol: &str) {
        self.present(Stage::SymbolLock {
            reel_index: position.reel,
            row_index: position.row,
            symbol: symbol.to_string(),
        })
        .await;
        self.cue(Stage::SymbolLoopStart {
            reel_index: position.reel,
            row_index: position.row,
        });
    }

    /// Move the ladder to the tier for the current trigger count
    async fn update_ladder(&mut self) {
        let Some(ladder) = self.ladder.as_mut() else {
            return;
        };
        let Some(change) = ladder.progress(self.trigger_count) else {
            return;
        };
        if let Some(previous) = change.previous {
            self.cue(Stage::LadderTierDeactivate {
                tier_index: previous as u32,
            });
        }
        self.present(Stage::LadderTierUnlock {
            tier_index: change.current as u32,
            credit_value: change.credit_value,
        })
        .await;
    }

    async fn present(&mut self, stage: Stage) {
        present_stage(&mut self.host, &mut self.timeline, stage, None).await;
    }

    fn cue(&mut self, stage: Stage) {
        cue_stage(&mut self.host, &mut self.timeline, stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LadderTierSpec;
    use crate::host::RecordingHost;
    use crate::payload::RawReward;

    fn trigger_grid(coins: usize) -> Vec<Vec<String>> {
        (0..5)
            .map(|reel| {
                (0..3)
                    .map(|row| {
                        if reel * 3 + row < coins {
                            "COIN".to_string()
                        } else {
                            "K".to_string()
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn session() -> FeatureSession<RecordingHost> {
        FeatureSession::new(RespinConfig::blackout("g"), RecordingHost::new("g")).unwrap()
    }

    #[tokio::test]
    async fn test_no_trigger_below_count() {
        let mut session = session();
        assert!(!session.on_standard_spin(&trigger_grid(5)).await);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.board().active_layer(), ReelLayer::Standard);
        assert!(session.host().trace.events.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_enters_independent_layer() {
        let mut session = session();
        assert!(session.on_standard_spin(&trigger_grid(6)).await);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Respinning);
        assert_eq!(snapshot.active_layer, ReelLayer::Independent);
        assert_eq!(snapshot.locked_slots, 6);
        assert_eq!(snapshot.trigger_count, 6);
        assert!(!session.can_round_end());

        let sequence = session.host().stage_sequence();
        assert_eq!(&sequence[..3], &["feature_enter", "layer_swap", "symbol_lock"]);
    }

    #[tokio::test]
    async fn test_reevaluation_ignored_when_idle() {
        let mut session = session();
        let outcome = session
            .on_reevaluation(&ReevaluationPayload::starting(3).with_remaining(2))
            .await;
        assert_eq!(outcome, ReevaluationOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_missing_start_value_uses_default() {
        let mut session = session();
        session.on_standard_spin(&trigger_grid(6)).await;
        let outcome = session.on_reevaluation(&ReevaluationPayload::default()).await;
        assert_eq!(outcome, ReevaluationOutcome::Continue { remaining: 2 });
        assert_eq!(session.budget().start_value(), Some(3));
    }

    #[tokio::test]
    async fn test_double_lock_ignored() {
        let mut session = session();
        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(3)
            .with_remaining(3)
            .with_lock(0, 0, "COIN")
            .with_lock(4, 2, "COIN");
        session.on_reevaluation(&payload).await;

        assert_eq!(session.board().locked_count(), 7);
        assert_eq!(session.host().trace.events_by_type("symbol_lock").len(), 7);
    }

    #[tokio::test]
    async fn test_resolution_returns_to_standard() {
        let mut session = session();
        session.set_bet_multiplier(2);
        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::credits(0, 0, 10));

        let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&payload).await else {
            panic!("expected resolution");
        };
        assert_eq!(summary.activation_total, 20);
        assert!(!summary.blackout);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.board().active_layer(), ReelLayer::Standard);
        assert!(session.can_round_end());
        assert_eq!(session.round_gate().running_total(), 20);

        let validation = session.host().trace.validate();
        assert!(validation.is_valid(), "{:?}", validation.warnings());
        assert_eq!(session.host().trace.total_win(), 20);
    }

    #[tokio::test]
    async fn test_big_win_fires_once() {
        let mut session = session();
        session.on_wager_changed(10);
        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::credits(0, 0, 100))
            .with_reward(RawReward::credits(0, 1, 200));

        let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&payload).await else {
            panic!("expected resolution");
        };
        assert_eq!(summary.big_win, Some(BigWinTier::MegaWin));
        assert_eq!(session.host().trace.events_by_type("big_win").len(), 1);

        let sequence = session.host().stage_sequence();
        let big_win = sequence.iter().position(|s| *s == "big_win").unwrap();
        let last_commit_rollup = sequence.iter().rposition(|s| *s == "rollup_end").unwrap();
        assert!(big_win > last_commit_rollup);
    }

    #[tokio::test]
    async fn test_unrewarded_slots_idle() {
        let mut session = session();
        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::credits(1, 0, 5));
        session.on_reevaluation(&payload).await;

        let trace = &session.host().trace;
        assert_eq!(trace.events_by_type("symbol_idle").len(), 5);
        assert_eq!(trace.events_by_type("symbol_resolve").len(), 1);
    }

    #[tokio::test]
    async fn test_ladder_wager_update() {
        let tiers = vec![LadderTierSpec::new(3, 2), LadderTierSpec::new(5, 10)];
        let config = RespinConfig::ladder("ladder", tiers);
        let mut session = FeatureSession::new(config, RecordingHost::new("ladder")).unwrap();
        session.on_wager_changed(4);

        assert!(session.on_standard_spin(&trigger_grid(3)).await);
        let ladder = session.ladder().unwrap();
        assert_eq!(ladder.active_tier(), Some(0));
        assert_eq!(ladder.active_credit_value(), Some(8));
        assert!(session.host().trace.has_stage("ladder_values_update"));
        assert!(session.host().trace.has_stage("ladder_tier_unlock"));
    }

    #[tokio::test]
    async fn test_shared_round_gate_carries_base_win() {
        let gate = RoundGate::new();
        let mut session = session().with_round_gate(gate.clone());
        gate.record_base_win(50);

        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::credits(1, 1, 10));
        let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&payload).await else {
            panic!("expected resolution");
        };

        assert_eq!(summary.activation_total, 10);
        assert_eq!(gate.running_total(), 60);
        assert!(!session.is_resolving_rewards());
        let rollup = session.host().trace.events_by_type("rollup_start");
        assert!(matches!(
            rollup[0].stage,
            Stage::RollupStart { start_amount: 50, target_amount: 60, .. }
        ));
    }

    #[tokio::test]
    async fn test_progressive_needs_blackout() {
        let mut session = session();
        session.on_standard_spin(&trigger_grid(6)).await;
        let payload = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::jackpot(0, 0, "progressive", 900))
            .with_reward(RawReward::credits(0, 1, 4));

        let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&payload).await else {
            panic!("expected resolution");
        };
        assert!(!summary.blackout);
        assert_eq!(summary.activation_total, 4);
        assert!(!session.host().trace.has_stage("jackpot_present"));
    }

    #[test]
    fn test_inverted_rollup_bounds_rejected() {
        let mut config = RespinConfig::blackout("g");
        config.rollup.min_seconds = 5.0;
        config.rollup.max_seconds = 1.0;
        assert!(FeatureSession::new(config, RecordingHost::new("g")).is_err());
    }

    #[test]
    fn test_ladder_variant_requires_table() {
        let mut config = RespinConfig::ladder("ladder", vec![LadderTierSpec::new(1, 2)]);
        config.ladder_tables.clear();
        assert!(FeatureSession::new(config, RecordingHost::new("ladder")).is_err());
    }
}
