//! End-to-end behaviour of a feature session driven through its host

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rf_respin::{
    AudioSink, BonusHost, BonusOutcome, BonusPayload, Economy, FeatureSession, LadderTierSpec,
    LockState, Presenter, ProgressiveJackpotWin, ProgressiveSource, RawReward,
    ReelLayerController, ReevaluationOutcome, ReevaluationPayload, RecordingHost, RespinConfig,
    RewardKind, RoundGate, SessionPhase,
};
use rf_stage::{ReelLayer, Stage, StageEvent};
use serde_json::json;
use tokio::sync::oneshot;

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// 5×3 grid with the first `coins` slots (reel-major) showing COIN
fn grid(coins: usize) -> Vec<Vec<String>> {
    (0..5)
        .map(|reel| {
            (0..3)
                .map(|row| {
                    if reel * 3 + row < coins {
                        "COIN".to_string()
                    } else {
                        "A".to_string()
                    }
                })
                .collect()
        })
        .collect()
}

fn blackout_session() -> FeatureSession<RecordingHost> {
    FeatureSession::new(RespinConfig::blackout("test"), RecordingHost::new("test")).unwrap()
}

fn assert_layers_exclusive(board: &ReelLayerController) {
    let active = board.active_layer();
    for reel in 0..board.grid().reels as usize {
        assert!(!board.is_reel_spin_locked(active, reel), "active reel {} locked", reel);
        assert!(
            board.is_reel_spin_locked(active.other(), reel),
            "inactive reel {} spinnable",
            reel
        );
    }
}

fn lock_states(board: &ReelLayerController) -> Vec<LockState> {
    let grid = board.grid();
    (0..grid.reels as usize)
        .flat_map(|reel| (0..grid.rows as usize).map(move |row| (reel, row)))
        .map(|(reel, row)| {
            board
                .slot(ReelLayer::Independent, reel, row)
                .map(|s| s.state())
                .unwrap_or_default()
        })
        .collect()
}

fn ladder_unlocks(host: &RecordingHost) -> Vec<u32> {
    host.trace
        .events
        .iter()
        .filter_map(|e| match e.stage {
            Stage::LadderTierUnlock { tier_index, .. } => Some(tier_index),
            _ => None,
        })
        .collect()
}

/// Host whose bonus game finishes only when the test sends its payout
struct GatedBonusHost {
    inner: RecordingHost,
    completion: Option<oneshot::Receiver<u64>>,
    commits: Rc<RefCell<Vec<u64>>>,
}

impl Presenter for GatedBonusHost {
    async fn present(&mut self, event: StageEvent) {
        self.inner.present(event).await;
    }

    fn cue(&mut self, event: StageEvent) {
        self.inner.cue(event);
    }
}

impl AudioSink for GatedBonusHost {
    fn play_sound(&mut self, cue: &str) {
        self.inner.play_sound(cue);
    }
}

impl Economy for GatedBonusHost {
    fn commit_credits(&mut self, amount: u64, reason: &str) {
        self.commits.borrow_mut().push(amount);
        self.inner.commit_credits(amount, reason);
    }
}

impl BonusHost for GatedBonusHost {
    async fn run_bonus(&mut self, _payload: &BonusPayload) -> BonusOutcome {
        let final_payout = match self.completion.take() {
            Some(rx) => rx.await.unwrap_or(0),
            None => 0,
        };
        BonusOutcome { final_payout }
    }
}

impl ProgressiveSource for GatedBonusHost {
    async fn progressive_jackpot_win(&mut self) -> Option<ProgressiveJackpotWin> {
        self.inner.progressive_jackpot_win().await
    }
}

/// Host that notes whether the round could end at every presented or cued stage
struct GateWatchHost {
    inner: RecordingHost,
    gate: RoundGate,
    observed: Vec<(&'static str, bool)>,
}

impl GateWatchHost {
    fn observe(&mut self, event: &StageEvent) {
        self.observed.push((event.type_name(), self.gate.can_round_end()));
    }

    fn can_end_at(&self, type_name: &str) -> Vec<bool> {
        self.observed
            .iter()
            .filter(|(name, _)| *name == type_name)
            .map(|(_, can_end)| *can_end)
            .collect()
    }
}

impl Presenter for GateWatchHost {
    async fn present(&mut self, event: StageEvent) {
        self.observe(&event);
        self.inner.present(event).await;
    }

    fn cue(&mut self, event: StageEvent) {
        self.observe(&event);
        self.inner.cue(event);
    }
}

impl AudioSink for GateWatchHost {
    fn play_sound(&mut self, cue: &str) {
        self.inner.play_sound(cue);
    }
}

impl Economy for GateWatchHost {
    fn commit_credits(&mut self, amount: u64, reason: &str) {
        self.inner.commit_credits(amount, reason);
    }
}

impl BonusHost for GateWatchHost {
    async fn run_bonus(&mut self, payload: &BonusPayload) -> BonusOutcome {
        self.inner.run_bonus(payload).await
    }
}

impl ProgressiveSource for GateWatchHost {
    async fn progressive_jackpot_win(&mut self) -> Option<ProgressiveJackpotWin> {
        self.inner.progressive_jackpot_win().await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_layer_exclusivity_through_activation() {
    let mut session = blackout_session();
    session.on_standard_spin(&grid(2)).await;
    assert_layers_exclusive(session.board());
    assert_eq!(session.board().active_layer(), ReelLayer::Standard);

    session.on_standard_spin(&grid(6)).await;
    assert_layers_exclusive(session.board());
    assert_eq!(session.board().active_layer(), ReelLayer::Independent);

    let payloads = [
        ReevaluationPayload::starting(2).with_remaining(2).with_lock(3, 0, "COIN"),
        ReevaluationPayload::default().with_remaining(1),
        ReevaluationPayload::default()
            .with_remaining(0)
            .with_reward(RawReward::credits(3, 0, 10)),
    ];
    for payload in &payloads {
        session.on_reevaluation(payload).await;
        assert_layers_exclusive(session.board());
    }
    assert_eq!(session.board().active_layer(), ReelLayer::Standard);
}

#[tokio::test]
async fn test_lock_states_only_move_forward() {
    let mut session = blackout_session();
    session.on_standard_spin(&grid(6)).await;

    let payloads = [
        ReevaluationPayload::starting(3)
            .with_remaining(3)
            .with_lock(2, 0, "COIN")
            .with_lock(4, 1, "COIN"),
        // Duplicate lock notifications for already locked slots
        ReevaluationPayload::default()
            .with_remaining(2)
            .with_lock(2, 0, "COIN")
            .with_lock(0, 0, "COIN"),
        ReevaluationPayload::default().with_remaining(1).with_lock(3, 2, "COIN"),
    ];

    let mut previous = lock_states(session.board());
    for payload in &payloads {
        session.on_reevaluation(payload).await;
        let current = lock_states(session.board());
        for (before, after) in previous.iter().zip(&current) {
            assert!(after >= before, "slot regressed from {:?} to {:?}", before, after);
        }
        previous = current;
    }
    assert_eq!(session.board().locked_count(), 9);

    let terminal = ReevaluationPayload::default()
        .with_remaining(0)
        .with_reward(RawReward::credits(2, 0, 5));
    session.on_reevaluation(&terminal).await;

    // Per slot: one lock, then exactly one of idle/resolve, never a relock
    let mut per_slot: HashMap<(u8, u8), Vec<&'static str>> = HashMap::new();
    for event in &session.host().trace.events {
        let key = match event.stage {
            Stage::SymbolLock { reel_index, row_index, .. }
            | Stage::SymbolIdle { reel_index, row_index }
            | Stage::SymbolResolve { reel_index, row_index } => (reel_index, row_index),
            _ => continue,
        };
        per_slot.entry(key).or_default().push(event.type_name());
    }
    assert_eq!(per_slot.len(), 9);
    for (slot, sequence) in &per_slot {
        assert_eq!(sequence.len(), 2, "slot {:?}: {:?}", slot, sequence);
        assert_eq!(sequence[0], "symbol_lock");
        assert!(matches!(sequence[1], "symbol_idle" | "symbol_resolve"));
    }
}

#[tokio::test]
async fn test_reward_categories_resolve_in_fixed_order() {
    let mut session = FeatureSession::new(
        RespinConfig::blackout("test"),
        RecordingHost::new("test").with_bonus_payouts([40]),
    )
    .unwrap();
    session.on_standard_spin(&grid(6)).await;

    let terminal = ReevaluationPayload::starting(1)
        .with_remaining(0)
        .with_reward(RawReward::bonus(0, 0, json!({ "name": "pick" })))
        .with_reward(RawReward::credits(1, 2, 15))
        .with_reward(RawReward::jackpot(0, 1, "minor", 80))
        .with_reward(RawReward::credits(0, 2, 5));
    let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&terminal).await else {
        panic!("expected resolution");
    };

    assert_eq!(
        summary.payout.kinds(),
        vec![
            RewardKind::Credits,
            RewardKind::Credits,
            RewardKind::Jackpot,
            RewardKind::Bonus
        ]
    );
    let credit_slots: Vec<(usize, usize)> = summary
        .payout
        .payouts
        .iter()
        .take(2)
        .map(|p| (p.reel_index, p.slot_position))
        .collect();
    assert_eq!(credit_slots, vec![(0, 2), (1, 2)]);

    let sequence = session.host().stage_sequence();
    let jackpot = sequence.iter().position(|s| *s == "jackpot_present").unwrap();
    let bonus = sequence.iter().position(|s| *s == "bonus_enter").unwrap();
    assert!(jackpot < bonus);
}

#[tokio::test]
async fn test_ladder_never_regresses() {
    let tiers = vec![
        LadderTierSpec::new(2, 1),
        LadderTierSpec::new(4, 3),
        LadderTierSpec::new(6, 8),
    ];
    let config = RespinConfig::ladder("ladder", tiers).with_trigger_count(2);
    let mut session = FeatureSession::new(config, RecordingHost::new("ladder")).unwrap();
    session.on_standard_spin(&grid(2)).await;

    let payloads = [
        ReevaluationPayload::starting(5).with_remaining(5),
        ReevaluationPayload::default().with_remaining(4).with_lock(2, 0, "COIN"),
        ReevaluationPayload::default().with_remaining(3).with_lock(2, 1, "COIN"),
        ReevaluationPayload::default().with_remaining(2),
        ReevaluationPayload::default()
            .with_remaining(1)
            .with_lock(3, 0, "COIN")
            .with_lock(3, 1, "COIN"),
    ];

    let mut tiers_seen = vec![session.snapshot().ladder_tier];
    for payload in &payloads {
        session.on_reevaluation(payload).await;
        tiers_seen.push(session.snapshot().ladder_tier);
    }
    assert!(tiers_seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", tiers_seen);
    assert_eq!(tiers_seen.last().copied().flatten(), Some(2));
    assert_eq!(ladder_unlocks(session.host()), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_committed_credits_conserved() {
    let host = RecordingHost::new("test")
        .with_bonus_payouts([333])
        .with_progressive(Some(ProgressiveJackpotWin {
            running_total: 7_777,
        }));
    let mut session = FeatureSession::new(RespinConfig::blackout("test"), host).unwrap();
    session.set_bet_multiplier(3);
    session.on_standard_spin(&grid(14)).await;

    let terminal = ReevaluationPayload::starting(3)
        .with_remaining(2)
        .with_lock(4, 2, "COIN")
        .with_reward(RawReward::credits(0, 0, 10))
        .with_reward(RawReward::credits(1, 0, 20))
        .with_reward(RawReward::jackpot(2, 0, "mini", 30))
        .with_reward(RawReward::jackpot(3, 0, "progressive", 2_500))
        .with_reward(RawReward::bonus(4, 2, json!({})))
        .with_reward(RawReward::other("mystery"));
    let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&terminal).await else {
        panic!("expected resolution");
    };

    let expected = (10 + 20 + 30) * 3 + 7_777 + 333;
    assert_eq!(summary.payout.total, expected);
    assert_eq!(summary.payout.progressive_mismatch, Some((7_500, 7_777)));
    assert_eq!(session.host().committed_total(), expected);
    assert_eq!(session.host().commits.len(), 5);
    assert_eq!(session.round_gate().running_total(), expected);
}

#[tokio::test]
async fn test_round_cannot_end_while_resolving() {
    let mut session = FeatureSession::new(
        RespinConfig::blackout("test"),
        RecordingHost::new("test").with_bonus_payouts([12]),
    )
    .unwrap();
    session.on_standard_spin(&grid(6)).await;
    let gate = session.round_gate();
    let done = Cell::new(false);

    let terminal = ReevaluationPayload::starting(1)
        .with_remaining(0)
        .with_reward(RawReward::credits(0, 0, 5))
        .with_reward(RawReward::bonus(1, 0, json!({})));

    let resolve = async {
        let outcome = session.on_reevaluation(&terminal).await;
        done.set(true);
        outcome
    };
    let probe = async {
        let mut observations = Vec::new();
        while !done.get() {
            observations.push((gate.is_resolving(), gate.can_round_end()));
            tokio::task::yield_now().await;
        }
        observations
    };
    let (outcome, observations) = tokio::join!(resolve, probe);

    assert!(matches!(outcome, ReevaluationOutcome::Resolved(_)));
    assert!(observations.iter().any(|(resolving, _)| *resolving));
    for (resolving, can_end) in &observations {
        assert_eq!(*can_end, !*resolving);
    }
    assert!(!gate.is_resolving());
    assert!(gate.can_round_end());
    assert!(session.can_round_end());
}

#[tokio::test]
async fn test_round_blocked_from_blackout_to_last_commit() {
    let gate = RoundGate::new();
    let host = GateWatchHost {
        inner: RecordingHost::new("test"),
        gate: gate.clone(),
        observed: Vec::new(),
    };
    let mut session = FeatureSession::new(RespinConfig::blackout("test"), host)
        .unwrap()
        .with_round_gate(gate.clone());
    session.on_standard_spin(&grid(14)).await;

    // Last free slot locks with respins left
    let terminal = ReevaluationPayload::starting(3)
        .with_remaining(3)
        .with_lock(4, 2, "COIN")
        .with_reward(RawReward::credits(0, 0, 5));
    let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&terminal).await else {
        panic!("expected resolution");
    };
    assert!(summary.blackout);

    let host = session.host();
    assert_eq!(host.can_end_at("feature_enter"), vec![true]);
    assert_eq!(host.can_end_at("respin_step"), vec![true]);
    assert_eq!(host.can_end_at("blackout"), vec![false]);
    assert_eq!(host.can_end_at("symbol_loop_stop"), vec![false; 15]);
    assert_eq!(host.can_end_at("symbol_idle"), vec![false; 14]);
    assert_eq!(host.can_end_at("symbol_resolve"), vec![false]);
    assert_eq!(host.can_end_at("rollup_end"), vec![false]);
    assert_eq!(host.can_end_at("feature_exit"), vec![true]);
    assert!(gate.can_round_end());
}

#[tokio::test]
async fn test_bonus_suspends_sequencer_until_completion() {
    let (tx, rx) = oneshot::channel();
    let commits = Rc::new(RefCell::new(Vec::new()));
    let host = GatedBonusHost {
        inner: RecordingHost::new("test"),
        completion: Some(rx),
        commits: commits.clone(),
    };
    let mut session = FeatureSession::new(RespinConfig::blackout("test"), host).unwrap();
    session.on_standard_spin(&grid(6)).await;
    let gate = session.round_gate();

    let terminal = ReevaluationPayload::starting(1)
        .with_remaining(0)
        .with_reward(RawReward::bonus(0, 0, json!({ "name": "wheel" })))
        .with_reward(RawReward::credits(1, 0, 25));

    let resolve = session.on_reevaluation(&terminal);
    let bonus_player = async {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        // Credits committed, bonus still in flight
        assert_eq!(*commits.borrow(), vec![25]);
        assert!(gate.is_resolving());
        tx.send(600).unwrap();
    };
    let (outcome, ()) = tokio::join!(resolve, bonus_player);

    let ReevaluationOutcome::Resolved(summary) = outcome else {
        panic!("expected resolution");
    };
    assert_eq!(summary.payout.total, 625);
    assert_eq!(*commits.borrow(), vec![25, 600]);
    assert!(gate.can_round_end());
}

// ═══════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_first_payload_without_rewards_continues() {
    let mut session = blackout_session();
    session.on_standard_spin(&grid(6)).await;

    let payload = ReevaluationPayload::starting(3)
        .with_remaining(2)
        .with_lock(3, 1, "COIN");
    let outcome = session.on_reevaluation(&payload).await;

    assert_eq!(outcome, ReevaluationOutcome::Continue { remaining: 2 });
    assert_eq!(session.budget().remaining(), 2);
    assert_eq!(session.phase(), SessionPhase::Respinning);
    assert_eq!(session.board().active_layer(), ReelLayer::Independent);
    assert!(session.host().commits.is_empty());
    assert!(!session.host().trace.has_stage("symbol_resolve"));
}

#[tokio::test]
async fn test_credits_then_bonus_with_bet_multiplier() {
    let mut session = FeatureSession::new(
        RespinConfig::blackout("test"),
        RecordingHost::new("test").with_bonus_payouts([275]),
    )
    .unwrap();
    session.set_bet_multiplier(2);
    session.on_standard_spin(&grid(6)).await;

    let terminal = ReevaluationPayload::starting(1)
        .with_remaining(0)
        .with_reward(RawReward::credits(0, 0, 500))
        .with_reward(RawReward::bonus(1, 1, json!({ "name": "free_games" })));
    session.on_reevaluation(&terminal).await;

    let host = session.host();
    let amounts: Vec<u64> = host.commits.iter().map(|c| c.amount).collect();
    assert_eq!(amounts, vec![1000, 275]);
    assert_eq!(host.committed_total(), 1275);
    assert_eq!(host.bonus_calls.len(), 1);
    assert_eq!(host.bonus_calls[0].name(), Some("free_games"));

    let sequence = host.stage_sequence();
    let first_rollup_end = sequence.iter().position(|s| *s == "rollup_end").unwrap();
    let transition_out = sequence.iter().position(|s| *s == "bonus_transition_out").unwrap();
    assert!(first_rollup_end < transition_out);
}

#[tokio::test]
async fn test_blackout_resolves_with_budget_left() {
    let mut session = blackout_session();
    session.on_standard_spin(&grid(6)).await;

    let mut payload = ReevaluationPayload::starting(3).with_remaining(1);
    for reel in 2..5 {
        for row in 0..3 {
            payload = payload.with_lock(reel, row, "COIN");
        }
    }
    let payload = payload.with_reward(RawReward::credits(4, 2, 100));

    let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&payload).await else {
        panic!("expected resolution");
    };
    assert!(summary.blackout);
    assert_eq!(summary.activation_total, 100);

    let trace = &session.host().trace;
    let remaining = trace.events.iter().find_map(|e| match e.stage {
        Stage::RespinStep { remaining, .. } => Some(remaining),
        _ => None,
    });
    assert_eq!(remaining, Some(1));
    assert!(trace.has_stage("blackout"));
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_ladder_skips_unreached_tier() {
    let tiers = vec![
        LadderTierSpec::new(1, 2),
        LadderTierSpec::new(3, 5),
        LadderTierSpec::new(5, 20),
    ];
    let config = RespinConfig::ladder("ladder", tiers).with_trigger_count(1);
    let mut session = FeatureSession::new(config, RecordingHost::new("ladder")).unwrap();
    session.on_wager_changed(10);

    // Count 1
    session.on_standard_spin(&grid(1)).await;
    // Count 2
    session
        .on_reevaluation(&ReevaluationPayload::starting(3).with_remaining(3).with_lock(1, 0, "COIN"))
        .await;
    // Count 5
    session
        .on_reevaluation(
            &ReevaluationPayload::default()
                .with_remaining(2)
                .with_lock(1, 1, "COIN")
                .with_lock(1, 2, "COIN")
                .with_lock(2, 0, "COIN"),
        )
        .await;

    assert_eq!(ladder_unlocks(session.host()), vec![0, 2]);
    let deactivated: Vec<u32> = session
        .host()
        .trace
        .events
        .iter()
        .filter_map(|e| match e.stage {
            Stage::LadderTierDeactivate { tier_index } => Some(tier_index),
            _ => None,
        })
        .collect();
    assert_eq!(deactivated, vec![0]);

    let terminal = ReevaluationPayload::default()
        .with_remaining(0)
        .with_reward(RawReward::end_reward(None));
    let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&terminal).await else {
        panic!("expected resolution");
    };
    assert_eq!(summary.activation_total, 200);
    assert_eq!(session.ladder().unwrap().active_tier(), None);
}

#[tokio::test]
async fn test_second_activation_starts_clean() {
    let mut session = blackout_session();
    for _ in 0..2 {
        session.begin_round();
        assert!(session.on_standard_spin(&grid(6)).await);
        assert_eq!(session.board().locked_count(), 6);
        assert!(!session.budget().is_initialized());

        let terminal = ReevaluationPayload::starting(1)
            .with_remaining(0)
            .with_reward(RawReward::credits(0, 0, 10));
        let ReevaluationOutcome::Resolved(summary) = session.on_reevaluation(&terminal).await
        else {
            panic!("expected resolution");
        };
        assert_eq!(summary.activation_total, 10);
        assert_eq!(session.round_gate().running_total(), 10);
    }
    assert_eq!(session.host().committed_total(), 20);
}
