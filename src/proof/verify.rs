//! Verification API
//!
//! Per-circuit predicates over public signals, and the capability seam a real
//! proof verifier plugs into. The predicates are stand-ins: they check signal
//! shape only, never a cryptographic proof.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::proof::envelope::ProofEnvelope;

/// Circuits the ledger knows how to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CircuitId {
    /// `count-threshold-v1`: one milestone window met or missed.
    #[serde(rename = "count-threshold-v1")]
    CountThreshold,
    /// `deadline-v1`: submission landed before a deadline.
    #[serde(rename = "deadline-v1")]
    Deadline,
    /// `oracle-fact-v1`: an external oracle attested a fact.
    #[serde(rename = "oracle-fact-v1")]
    OracleFact,
}

impl CircuitId {
    /// All known circuits.
    pub const ALL: [CircuitId; 3] = [
        CircuitId::CountThreshold,
        CircuitId::Deadline,
        CircuitId::OracleFact,
    ];

    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitId::CountThreshold => "count-threshold-v1",
            CircuitId::Deadline => "deadline-v1",
            CircuitId::OracleFact => "oracle-fact-v1",
        }
    }

    /// Look up a wire tag.
    pub fn from_tag(tag: &str) -> Option<CircuitId> {
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized circuit tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown circuit: {0}")]
pub struct UnknownCircuitTag(pub String);

impl FromStr for CircuitId {
    type Err = UnknownCircuitTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownCircuitTag(s.to_string()))
    }
}

/// Verify an envelope against its circuit's predicate.
///
/// Pure and total: unknown circuits and malformed signals are `false`.
pub fn verify_envelope(envelope: &ProofEnvelope) -> bool {
    match CircuitId::from_tag(&envelope.circuit_id) {
        Some(circuit) => check_predicate(circuit, envelope),
        None => false,
    }
}

/// Evaluate one circuit's predicate over the envelope's public signals.
pub fn check_predicate(circuit: CircuitId, envelope: &ProofEnvelope) -> bool {
    match circuit {
        CircuitId::CountThreshold => {
            let met = envelope.signal_number("met", 0.0);
            let target = envelope.signal_number("target", 0.0);
            let window_index = envelope.signal_number("windowIndex", -1.0);
            window_index >= 0.0 && target >= 1.0 && (met == 0.0 || met == 1.0)
        }
        CircuitId::Deadline => {
            let ok = envelope.signal_number("ok", 0.0);
            let submitted = envelope.signal_number("submissionEpoch", 0.0);
            let deadline = envelope.signal_number("deadlineEpoch", 0.0);
            (ok == 1.0 && submitted <= deadline) || ok == 0.0
        }
        CircuitId::OracleFact => {
            let ok = envelope.signal_number("ok", 0.0);
            ok == 1.0 || ok == 0.0
        }
    }
}

/// Proof verification capability.
///
/// A production deployment checks a cryptographic proof against the
/// verification key named by `vkId` and the same public signals. The
/// contract is boolean: absence of validity is `false`, never an error.
pub trait ProofVerifier: Send + Sync {
    /// Does the envelope carry a valid proof for `circuit`?
    fn verify(&self, circuit: CircuitId, envelope: &ProofEnvelope) -> bool;
}

/// Signal-shape predicates standing in for real proof verification.
#[derive(Clone, Copy, Debug, Default)]
pub struct PredicateVerifier;

impl ProofVerifier for PredicateVerifier {
    fn verify(&self, circuit: CircuitId, envelope: &ProofEnvelope) -> bool {
        check_predicate(circuit, envelope)
    }
}
