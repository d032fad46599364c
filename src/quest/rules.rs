//! Quest Rules
//!
//! Typed view of the rules document. The raw JSON is kept verbatim for
//! hashing; the typed fields are read once, validated, and defaulted here so
//! the ledger never walks optional paths.
//!
//! | Path                                               | Default |
//! |----------------------------------------------------|---------|
//! | `time.start`, `time.end`                           | none    |
//! | `time.milestoneFrequency.windowDays`               | unset (0 windows) |
//! | `economics.payoutMode`                             | `PPC`   |
//! | `economics.rewardPool.amount`                      | 0       |
//! | `economics.payoutWeights.completionWeight`         | 1       |
//! | `economics.payoutWeights.reputationWeight`         | 0       |
//! | `settlement.successCriteria.minWindowsCompletedPct`| 100     |

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::canonical::canonicalize;
use crate::core::hash::{rules_hash, RulesHash};

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// How the reward pool is split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutMode {
    /// Proportional to completion.
    #[default]
    #[serde(rename = "PPC")]
    Ppc,
    /// All or nothing.
    #[serde(rename = "AON")]
    Aon,
    /// Ranked tournament.
    #[serde(rename = "TOURNAMENT")]
    Tournament,
}

impl fmt::Display for PayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayoutMode::Ppc => "PPC",
            PayoutMode::Aon => "AON",
            PayoutMode::Tournament => "TOURNAMENT",
        })
    }
}

/// Rules document validation errors.
#[derive(Debug, Error)]
pub enum RulesError {
    /// Document is not valid JSON.
    #[error("rules document is not valid JSON: {0}")]
    Json(serde_json::Error),

    /// A known field has the wrong type or an unknown enum value.
    #[error("rules document does not match schema: {0}")]
    Schema(serde_json::Error),

    /// Timestamp neither RFC 3339 nor a plain date.
    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp {
        /// Field path.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// Cadence set but a window bound is missing.
    #[error("{field} is required when time.milestoneFrequency.windowDays is set")]
    MissingWindowBound {
        /// Field path.
        field: &'static str,
    },

    /// End precedes start.
    #[error("quest window ends ({end}) before it starts ({start})")]
    InvertedWindow {
        /// Start timestamp.
        start: DateTime<Utc>,
        /// End timestamp.
        end: DateTime<Utc>,
    },

    /// Cadence is not a whole, non-negative day count.
    #[error("time.milestoneFrequency.windowDays must be a whole number of days, got {0}")]
    InvalidWindowDays(f64),

    /// Economics value below zero.
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount {
        /// Field path.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Completion threshold outside 0..=100.
    #[error("settlement.successCriteria.minWindowsCompletedPct must be within 0..=100, got {0}")]
    MinCompletionOutOfRange(f64),
}

// =============================================================================
// RAW SCHEMA (as found in the document)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRules {
    time: Option<RawTime>,
    economics: Option<RawEconomics>,
    settlement: Option<RawSettlement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTime {
    start: Option<String>,
    end: Option<String>,
    milestone_frequency: Option<RawFrequency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrequency {
    window_days: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEconomics {
    payout_mode: Option<PayoutMode>,
    reward_pool: Option<RawRewardPool>,
    payout_weights: Option<RawWeights>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRewardPool {
    amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWeights {
    completion_weight: Option<f64>,
    reputation_weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettlement {
    success_criteria: Option<RawCriteria>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCriteria {
    min_windows_completed_pct: Option<f64>,
}

// =============================================================================
// VALIDATED RULES
// =============================================================================

/// Temporal window of the quest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timeline {
    /// Quest start.
    pub start: Option<DateTime<Utc>>,
    /// Quest end.
    pub end: Option<DateTime<Utc>>,
    /// Days per accounting window; `None` when unset or zero.
    pub window_days: Option<u32>,
}

impl Timeline {
    /// Number of accounting windows.
    ///
    /// `ceil(ceil((end - start) / 1 day) / windowDays)`, or 0 without a cadence.
    pub fn windows_total(&self) -> u32 {
        let (Some(window_days), Some(start), Some(end)) = (self.window_days, self.start, self.end)
        else {
            return 0;
        };
        let millis = (end - start).num_milliseconds().max(0) as u64;
        let days = millis.div_ceil(MILLIS_PER_DAY);
        let windows = days.div_ceil(u64::from(window_days));
        u32::try_from(windows).unwrap_or(u32::MAX)
    }
}

/// Reward economics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Economics {
    /// Payout mode.
    pub payout_mode: PayoutMode,
    /// `rewardPool.amount`.
    pub reward_pool: f64,
    /// `payoutWeights.completionWeight`.
    pub completion_weight: f64,
    /// `payoutWeights.reputationWeight`.
    pub reputation_weight: f64,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            payout_mode: PayoutMode::Ppc,
            reward_pool: 0.0,
            completion_weight: 1.0,
            reputation_weight: 0.0,
        }
    }
}

/// Settlement criteria.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettlementCriteria {
    /// Minimum completion, in percent, for the stake to be returned.
    pub min_windows_completed_pct: f64,
}

impl Default for SettlementCriteria {
    fn default() -> Self {
        Self {
            min_windows_completed_pct: 100.0,
        }
    }
}

/// A validated rules document together with its hash.
#[derive(Clone, Debug)]
pub struct QuestRules {
    document: Value,
    hash: RulesHash,
    timeline: Timeline,
    economics: Economics,
    settlement: SettlementCriteria,
}

impl QuestRules {
    /// Validate a rules document and take its hash.
    pub fn from_value(document: Value) -> Result<Self, RulesError> {
        let raw = RawRules::deserialize(&document).map_err(RulesError::Schema)?;

        let timeline = build_timeline(raw.time.unwrap_or_default())?;
        let economics = build_economics(raw.economics.unwrap_or_default())?;
        let settlement = build_settlement(raw.settlement.unwrap_or_default())?;
        let hash = rules_hash(&document);

        Ok(Self {
            document,
            hash,
            timeline,
            economics,
            settlement,
        })
    }

    /// Parse JSON text, then validate.
    pub fn from_json_str(text: &str) -> Result<Self, RulesError> {
        let document: Value = serde_json::from_str(text).map_err(RulesError::Json)?;
        Self::from_value(document)
    }

    /// The rules hash proofs must be bound to.
    pub fn hash(&self) -> RulesHash {
        self.hash
    }

    /// The document exactly as supplied.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Canonical encoding of the document.
    pub fn canonical(&self) -> String {
        canonicalize(&self.document)
    }

    /// Temporal window.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Reward economics.
    pub fn economics(&self) -> &Economics {
        &self.economics
    }

    /// Settlement criteria.
    pub fn settlement(&self) -> &SettlementCriteria {
        &self.settlement
    }
}

fn build_timeline(raw: RawTime) -> Result<Timeline, RulesError> {
    let start = raw
        .start
        .as_deref()
        .map(|s| parse_timestamp("time.start", s))
        .transpose()?;
    let end = raw
        .end
        .as_deref()
        .map(|s| parse_timestamp("time.end", s))
        .transpose()?;
    let window_days = raw
        .milestone_frequency
        .and_then(|f| f.window_days)
        .map(whole_days)
        .transpose()?
        .filter(|d| *d > 0);

    if window_days.is_some() {
        if start.is_none() {
            return Err(RulesError::MissingWindowBound { field: "time.start" });
        }
        if end.is_none() {
            return Err(RulesError::MissingWindowBound { field: "time.end" });
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(RulesError::InvertedWindow { start, end });
        }
    }

    Ok(Timeline {
        start,
        end,
        window_days,
    })
}

/// `7` and `7.0` are the same cadence; `7.5` and `-7` are not cadences.
fn whole_days(value: f64) -> Result<u32, RulesError> {
    if value.is_finite() && value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Ok(value as u32)
    } else {
        Err(RulesError::InvalidWindowDays(value))
    }
}

fn build_economics(raw: RawEconomics) -> Result<Economics, RulesError> {
    let defaults = Economics::default();
    let weights = raw.payout_weights.unwrap_or_default();

    let economics = Economics {
        payout_mode: raw.payout_mode.unwrap_or(defaults.payout_mode),
        reward_pool: raw
            .reward_pool
            .and_then(|p| p.amount)
            .unwrap_or(defaults.reward_pool),
        completion_weight: weights.completion_weight.unwrap_or(defaults.completion_weight),
        reputation_weight: weights.reputation_weight.unwrap_or(defaults.reputation_weight),
    };

    for (field, value) in [
        ("economics.rewardPool.amount", economics.reward_pool),
        ("economics.payoutWeights.completionWeight", economics.completion_weight),
        ("economics.payoutWeights.reputationWeight", economics.reputation_weight),
    ] {
        if value < 0.0 {
            return Err(RulesError::NegativeAmount { field, value });
        }
    }

    Ok(economics)
}

fn build_settlement(raw: RawSettlement) -> Result<SettlementCriteria, RulesError> {
    let min = raw
        .success_criteria
        .and_then(|c| c.min_windows_completed_pct)
        .unwrap_or(SettlementCriteria::default().min_windows_completed_pct);

    if !(0.0..=100.0).contains(&min) {
        return Err(RulesError::MinCompletionOutOfRange(min));
    }

    Ok(SettlementCriteria {
        min_windows_completed_pct: min,
    })
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
///
/// Offset-less date-times are rejected: their instant depends on the host
/// timezone.
fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, RulesError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RulesError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}
