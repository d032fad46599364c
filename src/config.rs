//! Simulator configuration.

use tracing::warn;

/// Settings that sit outside the rules document.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// Asset symbol the reward pool pays out in.
    pub main_reward_asset: String,
    /// Asset symbol used for the returned stake.
    pub stake_return_asset: String,
    /// Stake recorded for a lazily created player.
    pub default_stake: f64,
    /// Reputation-tier multiplier applied to the reputation weight.
    pub reputation_factor: f64,
    /// Substitute `<0x...` questHash placeholders when running fixtures.
    pub resolve_placeholders: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            main_reward_asset: "PACT".to_string(),
            stake_return_asset: "ADAStakeReturn".to_string(),
            default_stake: 50.0,
            reputation_factor: 0.05,
            resolve_placeholders: true,
        }
    }
}

impl SimulatorConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables keep their defaults; unparseable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            main_reward_asset: lookup("QUEST_MAIN_REWARD_ASSET")
                .unwrap_or(defaults.main_reward_asset),
            stake_return_asset: lookup("QUEST_STAKE_RETURN_ASSET")
                .unwrap_or(defaults.stake_return_asset),
            default_stake: parse_amount(&lookup, "QUEST_DEFAULT_STAKE", defaults.default_stake),
            reputation_factor: parse_amount(
                &lookup,
                "QUEST_REPUTATION_FACTOR",
                defaults.reputation_factor,
            ),
            resolve_placeholders: lookup("QUEST_RESOLVE_PLACEHOLDERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.resolve_placeholders),
        }
    }
}

fn parse_amount<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            warn!(key, value = %raw, "ignoring config value, expected a finite non-negative number");
            default
        }
    }
}
