//! Payout Sequencer — drains the reward ledger in resolution order
//!
//! Categories play strictly one after another: credits, jackpots, the
//! progressive jackpot, then bonus games. Every record is awaited to
//! completion before the next one starts, so at most one nested bonus game
//! is ever in flight.

use rf_stage::{JackpotTier, Stage};
use serde::{Deserialize, Serialize};

use crate::board::ReelLayerController;
use crate::config::RespinConfig;
use crate::host::{FeatureHost, cue_stage, present_stage};
use crate::ledger::{RewardKind, RewardLedger, RewardRecord};
use crate::payload::BonusPayload;
use crate::round::{ResolvingGuard, RoundGate};
use crate::timing::Timeline;

/// One paid reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub kind: RewardKind,
    pub reel_index: usize,
    pub slot_position: usize,
    pub amount: u64,
}

/// Everything one resolution paid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReport {
    pub payouts: Vec<Payout>,
    pub total: u64,
    /// `(local estimate, server value)` when the progressive values disagreed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progressive_mismatch: Option<(u64, u64)>,
}

impl PayoutReport {
    fn record(&mut self, record: &RewardRecord, amount: u64) {
        self.total = self.total.saturating_add(amount);
        self.payouts.push(Payout {
            kind: record.kind,
            reel_index: record.reel_index,
            slot_position: record.slot_position,
            amount,
        });
    }

    /// Kinds in the order they were paid
    pub fn kinds(&self) -> Vec<RewardKind> {
        self.payouts.iter().map(|p| p.kind).collect()
    }
}

/// Borrowed view of a session used for one resolution pass
pub struct PayoutSequencer<'a, H: FeatureHost> {
    host: &'a mut H,
    board: &'a mut ReelLayerController,
    timeline: &'a mut Timeline,
    config: &'a RespinConfig,
    gate: &'a RoundGate,
}

impl<'a, H: FeatureHost> PayoutSequencer<'a, H> {
    pub fn new(
        host: &'a mut H,
        board: &'a mut ReelLayerController,
        timeline: &'a mut Timeline,
        config: &'a RespinConfig,
        gate: &'a RoundGate,
    ) -> Self {
        Self {
            host,
            board,
            timeline,
            config,
            gate,
        }
    }

    /// Pay every record of the ledger
    ///
    /// The caller holds the round gate's resolving guard for the whole pass.
    pub async fn resolve(
        mut self,
        ledger: &RewardLedger,
        resolving: &ResolvingGuard,
    ) -> PayoutReport {
        debug_assert!(resolving.guards(self.gate));
        let mut report = PayoutReport::default();

        log::debug!("resolving {} rewards", ledger.len());

        for kind in RewardKind::RESOLUTION_ORDER {
            for record in ledger.records(kind) {
                let amount = match kind {
                    RewardKind::Credits | RewardKind::Jackpot => self.pay_credits(record).await,
                    RewardKind::ProgressiveJackpot => {
                        self.pay_progressive(record, &mut report).await
                    }
                    RewardKind::Bonus => self.pay_bonus(record).await,
                };
                report.record(record, amount);
            }
        }

        log::info!(
            "resolved {} rewards, total {}",
            report.payouts.len(),
            report.total
        );
        report
    }

    async fn pay_credits(&mut self, record: &RewardRecord) -> u64 {
        let amount = record.credit_amount().unwrap_or(0);
        self.settle_slot(record).await;

        if let Some(tier) = record.jackpot_tier {
            self.present_jackpot(tier, amount).await;
        }

        self.rollup(record.kind, amount).await;
        self.commit(amount);
        amount
    }

    async fn pay_progressive(&mut self, record: &RewardRecord, report: &mut PayoutReport) -> u64 {
        let estimate = record.credit_amount().unwrap_or(0);
        let amount = match self.host.progressive_jackpot_win().await {
            Some(win) => {
                if win.running_total != estimate {
                    log::warn!(
                        "progressive jackpot estimate {} differs from server value {}, paying server value",
                        estimate,
                        win.running_total
                    );
                    report.progressive_mismatch = Some((estimate, win.running_total));
                }
                win.running_total
            }
            None => {
                log::warn!(
                    "no progressive jackpot outcome from server, paying local estimate {}",
                    estimate
                );
                estimate
            }
        };

        self.settle_slot(record).await;
        self.present_jackpot(JackpotTier::Progressive, amount).await;
        self.rollup(record.kind, amount).await;
        self.commit(amount);
        amount
    }

    async fn pay_bonus(&mut self, record: &RewardRecord) -> u64 {
        let payload = record
            .bonus_payload()
            .cloned()
            .unwrap_or_else(|| BonusPayload(serde_json::Value::Null));
        self.settle_slot(record).await;

        let transitions = &self.config.bonus_transitions;
        present_stage(
            self.host,
            self.timeline,
            Stage::BonusTransitionOut,
            Some(transitions.transition_out.as_str()),
        )
        .await;
        cue_stage(
            self.host,
            self.timeline,
            Stage::BonusEnter {
                bonus_name: payload.name().map(str::to_string),
            },
        );

        let outcome = self.host.run_bonus(&payload).await;
        log::debug!("bonus game finished with {}", outcome.final_payout);

        cue_stage(
            self.host,
            self.timeline,
            Stage::BonusExit {
                total_win: outcome.final_payout,
            },
        );
        present_stage(
            self.host,
            self.timeline,
            Stage::BonusTransitionIn,
            Some(transitions.transition_in.as_str()),
        )
        .await;

        self.rollup(RewardKind::Bonus, outcome.final_payout).await;
        self.commit(outcome.final_payout);
        outcome.final_payout
    }

    /// Move the reward's slot to resolved and play its resolve stage
    async fn settle_slot(&mut self, record: &RewardRecord) {
        if !self.board.resolve_slot(record.reel_index, record.slot_position) {
            log::warn!(
                "reward at ({}, {}) has no locked symbol to resolve",
                record.reel_index,
                record.slot_position
            );
        }
        let (reel_index, row_index) = stage_position(record.reel_index, record.slot_position);
        present_stage(
            self.host,
            self.timeline,
            Stage::SymbolResolve {
                reel_index,
                row_index,
            },
            None,
        )
        .await;
    }

    async fn present_jackpot(&mut self, tier: JackpotTier, amount: u64) {
        let presentation = self.config.jackpot_presentations.for_tier(tier);
        present_stage(
            self.host,
            self.timeline,
            Stage::JackpotPresent { tier, amount },
            Some(presentation),
        )
        .await;
    }

    /// Count the win meter up by `amount`
    async fn rollup(&mut self, kind: RewardKind, amount: u64) {
        let start_amount = self.gate.running_total();
        let target_amount = start_amount.saturating_add(amount);

        if let Some(duration_ms) = self.config.rollup.duration_ms(amount) {
            let sounds = self.config.rollup_sounds.for_kind(kind);
            self.host.play_sound(&sounds.loop_cue);
            present_stage(
                self.host,
                self.timeline,
                Stage::RollupStart {
                    start_amount,
                    target_amount,
                    duration_ms,
                },
                None,
            )
            .await;
            self.timeline.advance(duration_ms);
            self.host.play_sound(&sounds.end_cue);
            cue_stage(
                self.host,
                self.timeline,
                Stage::RollupEnd {
                    final_amount: target_amount,
                },
            );
        }

        self.gate.add(amount);
    }

    fn commit(&mut self, amount: u64) {
        self.host.commit_credits(amount, &self.config.feature_name);
    }
}

/// Board coordinates as stage indices
pub(crate) fn stage_position(reel: usize, row: usize) -> (u8, u8) {
    (
        u8::try_from(reel).unwrap_or(u8::MAX),
        u8::try_from(row).unwrap_or(u8::MAX),
    )
}
