//! Settlement Engine
//!
//! Converts a player's accumulated progress into a payout record.
//!
//! ```text
//! eligible = completionPct >= minWindowsCompletedPct / 100
//! base     = pool * completionWeight * completionPct
//! rep      = pool * reputationWeight * reputationFactor
//! total    = round2(base + rep)
//! rewards  = { main: total, stakeReturn: eligible ? stake : 0 }
//! ```
//!
//! Payout and eligibility are independent: an ineligible player still
//! accrues the completion payout, only the stake is withheld.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SimulatorConfig;
use crate::quest::rules::{PayoutMode, QuestRules};
use crate::quest::state::PlayerState;

/// Outcome of one settlement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Mode declared by the rules.
    pub payout_mode: PayoutMode,
    /// Completion threshold met.
    pub eligible: bool,
    /// Completion ratio settled against.
    pub completion_pct: f64,
    /// Completion component, unrounded.
    pub base_reward: f64,
    /// Reputation component, unrounded.
    pub reputation_reward: f64,
    /// `round2(base + rep)`, paid in the main reward asset.
    pub total_reward: f64,
    /// Stake paid back, 0 when ineligible.
    pub stake_return: f64,
}

/// Round half up to two decimals, the way `Math.round(x * 100) / 100` does.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded / 100.0
}

/// Does `completion_pct` clear a threshold given in percent?
pub fn is_eligible(completion_pct: f64, min_windows_completed_pct: f64) -> bool {
    completion_pct >= min_windows_completed_pct / 100.0
}

/// Compute the payout for a completion ratio.
///
/// AON and TOURNAMENT carry no distinct formula yet and settle as PPC.
pub fn compute_payout(
    rules: &QuestRules,
    config: &SimulatorConfig,
    completion_pct: f64,
    stake_amount: f64,
) -> Settlement {
    let economics = rules.economics();
    if economics.payout_mode != PayoutMode::Ppc {
        warn!(
            mode = %economics.payout_mode,
            "payout mode has no dedicated formula, settling as PPC"
        );
    }

    let eligible = is_eligible(completion_pct, rules.settlement().min_windows_completed_pct);
    let base_reward = economics.reward_pool * economics.completion_weight * completion_pct;
    let reputation_reward =
        economics.reward_pool * economics.reputation_weight * config.reputation_factor;

    Settlement {
        payout_mode: economics.payout_mode,
        eligible,
        completion_pct,
        base_reward,
        reputation_reward,
        total_reward: round2(base_reward + reputation_reward),
        stake_return: if eligible { stake_amount } else { 0.0 },
    }
}

/// Settle a player in place.
///
/// Recomputes from current progress on every call; the previous reward map
/// is replaced, not merged.
pub fn settle_player(
    player: &mut PlayerState,
    rules: &QuestRules,
    config: &SimulatorConfig,
) -> Settlement {
    let settlement = compute_payout(rules, config, player.completion_pct, player.stake_amount);

    player.eligible_to_settle = settlement.eligible;
    player.settled = true;
    player.claimable_rewards.clear();
    player
        .claimable_rewards
        .insert(config.main_reward_asset.clone(), settlement.total_reward);
    player
        .claimable_rewards
        .insert(config.stake_return_asset.clone(), settlement.stake_return);

    settlement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::state::QuestPhase;
    use serde_json::json;

    fn rules(min_pct: f64, mode: &str) -> QuestRules {
        QuestRules::from_value(json!({
            "economics": {
                "payoutMode": mode,
                "rewardPool": { "amount": 10000, "asset": "PACT" },
                "payoutWeights": { "completionWeight": 0.8, "reputationWeight": 0.2 }
            },
            "settlement": { "successCriteria": { "minWindowsCompletedPct": min_pct } }
        }))
        .unwrap()
    }

    fn player_with(met: u32, total: u32) -> PlayerState {
        let mut p = PlayerState::new(50.0, total);
        for w in 0..met {
            p.record_milestone(true, w.to_string());
        }
        p
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(6100.0), 6100.0);
        assert_eq!(round2(1.005), 1.0); // 100.49999... below the half
        assert_eq!(round2(2.345), 2.35);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.12); // half rounds toward +inf
        assert_eq!(round2(1234.5678), 1234.57);
    }

    #[test]
    fn test_eligible_payout() {
        let mut p = player_with(3, 4);
        let s = settle_player(&mut p, &rules(75.0, "PPC"), &SimulatorConfig::default());

        assert!(s.eligible);
        assert_eq!(s.total_reward, 6100.0);
        assert!(p.eligible_to_settle);
        assert_eq!(p.phase(), QuestPhase::Settled);
        assert_eq!(p.claimable("PACT"), 6100.0);
        assert_eq!(p.claimable("ADAStakeReturn"), 50.0);
    }

    #[test]
    fn test_ineligible_still_paid() {
        let mut p = player_with(3, 4);
        let s = settle_player(&mut p, &rules(100.0, "PPC"), &SimulatorConfig::default());

        assert!(!s.eligible);
        assert!(!p.eligible_to_settle);
        assert_eq!(p.claimable("PACT"), 6100.0);
        assert_eq!(p.claimable("ADAStakeReturn"), 0.0);
    }

    #[test]
    fn test_resettlement_recomputes() {
        let rules = rules(75.0, "PPC");
        let config = SimulatorConfig::default();
        let mut p = player_with(2, 4);

        settle_player(&mut p, &rules, &config);
        assert!(!p.eligible_to_settle);
        assert_eq!(p.claimable("PACT"), 4100.0);

        p.record_milestone(true, "2".into());
        settle_player(&mut p, &rules, &config);
        assert!(p.eligible_to_settle);
        assert_eq!(p.claimable("PACT"), 6100.0);
        assert_eq!(p.claimable_rewards.len(), 2);
    }

    #[test]
    fn test_zero_progress() {
        let mut p = PlayerState::new(50.0, 0);
        let s = settle_player(&mut p, &rules(0.0, "PPC"), &SimulatorConfig::default());

        // Threshold 0 is met by a 0 ratio; only the reputation part pays.
        assert!(s.eligible);
        assert_eq!(s.base_reward, 0.0);
        assert_eq!(p.claimable("PACT"), 100.0);
        assert_eq!(p.claimable("ADAStakeReturn"), 50.0);
    }

    #[test]
    fn test_other_modes_settle_as_ppc() {
        for mode in ["AON", "TOURNAMENT"] {
            let mut p = player_with(3, 4);
            let s = settle_player(&mut p, &rules(75.0, mode), &SimulatorConfig::default());
            assert_eq!(s.total_reward, 6100.0);
            assert_ne!(s.payout_mode, PayoutMode::Ppc);
        }
    }

    #[test]
    fn test_custom_assets_and_factor() {
        let config = SimulatorConfig {
            main_reward_asset: "GEM".into(),
            stake_return_asset: "STAKE".into(),
            reputation_factor: 0.1,
            ..SimulatorConfig::default()
        };
        let mut p = player_with(4, 4);
        settle_player(&mut p, &rules(100.0, "PPC"), &config);

        assert_eq!(p.claimable("GEM"), 8200.0);
        assert_eq!(p.claimable("STAKE"), 50.0);
        assert!(!p.claimable_rewards.contains_key("PACT"));
    }
}
