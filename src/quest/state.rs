//! Per-player quest state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::quest::events::QuestEvent;

/// Lifecycle phase of a player. Settlement is not terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestPhase {
    /// Accepting proofs, never settled.
    Active,
    /// Settled at least once.
    Settled,
}

/// State for one (contract, player address) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Always true once the player exists.
    pub joined: bool,
    /// Stake returned on eligible settlement.
    pub stake_amount: f64,
    /// Windows with an accepted `met == 1` proof. Never decreases.
    pub windows_met: u32,
    /// Windows in the quest, fixed at creation.
    pub windows_total: u32,
    /// `windows_met / windows_total`, 0 without windows.
    pub completion_pct: f64,
    /// Result of the last settlement's eligibility check.
    pub eligible_to_settle: bool,
    /// Set by settlement.
    pub settled: bool,
    /// Asset symbol to amount, written by settlement.
    pub claimable_rewards: BTreeMap<String, f64>,
    /// Append-only transition log, in processing order.
    pub events: Vec<QuestEvent>,
}

impl PlayerState {
    /// Fresh player.
    pub fn new(stake_amount: f64, windows_total: u32) -> Self {
        Self {
            joined: true,
            stake_amount,
            windows_met: 0,
            windows_total,
            completion_pct: 0.0,
            eligible_to_settle: false,
            settled: false,
            claimable_rewards: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> QuestPhase {
        if self.settled {
            QuestPhase::Settled
        } else {
            QuestPhase::Active
        }
    }

    /// Record a milestone proof and refresh the completion ratio.
    pub fn record_milestone(&mut self, met: bool, window: String) -> QuestEvent {
        let event = if met {
            self.windows_met = self.windows_met.saturating_add(1);
            QuestEvent::MilestoneMet { window }
        } else {
            QuestEvent::MilestoneMissed { window }
        };
        self.events.push(event.clone());
        self.completion_pct = completion_ratio(self.windows_met, self.windows_total);
        event
    }

    /// Append an event.
    pub fn push_event(&mut self, event: QuestEvent) {
        self.events.push(event);
    }

    /// Events rendered as labels.
    pub fn event_labels(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Claimable amount for an asset, 0 when absent.
    pub fn claimable(&self, asset: &str) -> f64 {
        self.claimable_rewards.get(asset).copied().unwrap_or(0.0)
    }
}

/// `met / total`, or 0 when there are no windows.
///
/// Not clamped: more met proofs than windows yields a ratio above 1.
pub fn completion_ratio(met: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(met) / f64::from(total)
    }
}
