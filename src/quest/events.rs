//! Player event log entries.
//!
//! Events are stored typed and rendered as the human-readable labels the
//! audit trail exposes (`MilestoneMet[0]`, `DeadlineOk`, `OracleOk[strava]`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One accepted state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum QuestEvent {
    /// A milestone window was met. Carries the rendered `windowIndex` signal.
    MilestoneMet {
        /// Window label.
        window: String,
    },
    /// A milestone window was missed.
    MilestoneMissed {
        /// Window label.
        window: String,
    },
    /// A deadline proof was accepted.
    DeadlineOk,
    /// An oracle attested its fact.
    OracleOk {
        /// Rendered `oracleId` signal.
        oracle: String,
    },
}

impl fmt::Display for QuestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestEvent::MilestoneMet { window } => write!(f, "MilestoneMet[{window}]"),
            QuestEvent::MilestoneMissed { window } => write!(f, "MilestoneMissed[{window}]"),
            QuestEvent::DeadlineOk => f.write_str("DeadlineOk"),
            QuestEvent::OracleOk { oracle } => write!(f, "OracleOk[{oracle}]"),
        }
    }
}

/// Label that is not a known event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized event label: {0:?}")]
pub struct ParseEventError(pub String);

impl FromStr for QuestEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "DeadlineOk" {
            return Ok(QuestEvent::DeadlineOk);
        }

        let (name, arg) = s
            .strip_suffix(']')
            .and_then(|rest| rest.split_once('['))
            .ok_or_else(|| ParseEventError(s.to_string()))?;
        let arg = arg.to_string();

        match name {
            "MilestoneMet" => Ok(QuestEvent::MilestoneMet { window: arg }),
            "MilestoneMissed" => Ok(QuestEvent::MilestoneMissed { window: arg }),
            "OracleOk" => Ok(QuestEvent::OracleOk { oracle: arg }),
            _ => Err(ParseEventError(s.to_string())),
        }
    }
}

impl From<QuestEvent> for String {
    fn from(event: QuestEvent) -> Self {
        event.to_string()
    }
}

impl TryFrom<String> for QuestEvent {
    type Error = ParseEventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let met = QuestEvent::MilestoneMet { window: "0".into() };
        let missed = QuestEvent::MilestoneMissed { window: "undefined".into() };
        let oracle = QuestEvent::OracleOk { oracle: "strava".into() };

        assert_eq!(met.to_string(), "MilestoneMet[0]");
        assert_eq!(missed.to_string(), "MilestoneMissed[undefined]");
        assert_eq!(QuestEvent::DeadlineOk.to_string(), "DeadlineOk");
        assert_eq!(oracle.to_string(), "OracleOk[strava]");
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(
            "MilestoneMet[3]".parse::<QuestEvent>(),
            Ok(QuestEvent::MilestoneMet { window: "3".into() })
        );
        assert_eq!(
            "OracleOk[a[b]]".parse::<QuestEvent>(),
            Ok(QuestEvent::OracleOk { oracle: "a[b]".into() })
        );
        assert!("DeadlineMissed".parse::<QuestEvent>().is_err());
        assert!("MilestoneMet[0".parse::<QuestEvent>().is_err());
        assert!("Bogus[1]".parse::<QuestEvent>().is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        let events = vec![
            QuestEvent::MilestoneMet { window: "0".into() },
            QuestEvent::DeadlineOk,
        ];
        let json = serde_json::to_string(&events).unwrap();
        assert_eq!(json, r#"["MilestoneMet[0]","DeadlineOk"]"#);

        let back: Vec<QuestEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, events);
    }
}
