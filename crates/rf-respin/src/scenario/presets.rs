//! Built-in scenario presets

use serde_json::json;

use super::Scenario;
use crate::config::{LadderTierSpec, RespinConfig};
use crate::payload::{ProgressiveJackpotWin, RawReward, ReevaluationPayload};

/// A scenario together with the configuration it was written for
#[derive(Debug, Clone)]
pub struct Preset {
    pub config: RespinConfig,
    pub scenario: Scenario,
}

/// Get all built-in presets
pub fn all_presets() -> Vec<Preset> {
    vec![blackout_demo(), ladder_demo()]
}

/// Find a preset by scenario id
pub fn preset_by_id(id: &str) -> Option<Preset> {
    all_presets().into_iter().find(|p| p.scenario.id == id)
}

/// Blackout demo: the board fills with budget left, every reward kind pays
pub fn blackout_demo() -> Preset {
    let payloads = vec![
        ReevaluationPayload::starting(3)
            .with_remaining(3)
            .with_lock(2, 0, "COIN")
            .with_lock(2, 1, "COIN")
            .with_lock(2, 2, "COIN"),
        ReevaluationPayload::default()
            .with_remaining(3)
            .with_lock(3, 0, "COIN")
            .with_lock(3, 1, "COIN")
            .with_lock(3, 2, "COIN"),
        ReevaluationPayload::default()
            .with_remaining(2)
            .with_lock(4, 0, "COIN")
            .with_lock(4, 1, "COIN")
            .with_lock(4, 2, "COIN")
            .with_reward(RawReward::bonus(4, 2, json!({ "name": "wheel_of_fortune" })))
            .with_reward(RawReward::jackpot(2, 2, "progressive", 5_000))
            .with_reward(RawReward::credits(0, 0, 50))
            .with_reward(RawReward::jackpot(1, 1, "major", 500))
            .with_reward(RawReward::credits(3, 1, 25)),
    ];

    Preset {
        config: RespinConfig::blackout("blackout_demo"),
        scenario: Scenario {
            id: "blackout_demo".to_string(),
            name: "Blackout Demo".to_string(),
            description: "Board fills before the meter runs out; credits, major, progressive and a bonus game pay in order".to_string(),
            wager: 100,
            bet_multiplier: 2,
            standard_grid: grid_with_coins(6),
            reevaluations: payloads,
            progressive: Some(ProgressiveJackpotWin {
                running_total: 10_120,
            }),
            bonus_payouts: vec![750],
        },
    }
}

/// Ladder demo: trigger count skips a tier, end reward pays the top tier
pub fn ladder_demo() -> Preset {
    let tiers = vec![
        LadderTierSpec::new(1, 2),
        LadderTierSpec::new(3, 5),
        LadderTierSpec::new(5, 20),
    ];
    let payloads = vec![
        ReevaluationPayload::starting(3)
            .with_remaining(3)
            .with_lock(1, 0, "COIN"),
        ReevaluationPayload::default()
            .with_remaining(2)
            .with_lock(2, 0, "COIN")
            .with_lock(2, 1, "COIN"),
        ReevaluationPayload::default().with_remaining(1),
        ReevaluationPayload::default()
            .with_remaining(0)
            .with_reward(RawReward::credits(1, 0, 25))
            .with_reward(RawReward::end_reward(Some(100))),
    ];

    Preset {
        config: RespinConfig::ladder("ladder_demo", tiers),
        scenario: Scenario {
            id: "ladder_demo".to_string(),
            name: "Ladder Demo".to_string(),
            description: "Ladder climbs from tier 1 straight to tier 2 and pays it as the end reward".to_string(),
            wager: 5,
            bet_multiplier: 1,
            standard_grid: grid_with_coins(3),
            reevaluations: payloads,
            progressive: None,
            bonus_payouts: Vec::new(),
        },
    }
}

/// 5×3 standard grid with the first `coins` slots (reel-major) showing COIN
fn grid_with_coins(coins: usize) -> Vec<Vec<String>> {
    const FILLER: [&str; 3] = ["K", "Q", "J"];
    (0..5)
        .map(|reel| {
            (0..3)
                .map(|row| {
                    if reel * 3 + row < coins {
                        "COIN".to_string()
                    } else {
                        FILLER[row].to_string()
                    }
                })
                .collect()
        })
        .collect()
}
