//! Quest Ledger
//!
//! One contract instance: the bound rules, the nullifier registry and the
//! player map. Every `submit_proof` runs the admission pipeline to completion
//! before touching state:
//!
//! ```text
//! envelope ──► circuit tag ──► verify ──► questHash ──► nullifiers (check)
//!                                                           │
//!              player state ◄── consume + apply ◄── plan effect
//! ```
//!
//! Nothing is written until every check, including the circuit's own effect
//! precondition, has passed. A rejected envelope leaves the registry and
//! every player untouched.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SimulatorConfig;
use crate::core::hash::RulesHash;
use crate::proof::envelope::ProofEnvelope;
use crate::proof::nullifier::{NullifierRegistry, NullifierReused};
use crate::proof::verify::{CircuitId, PredicateVerifier, ProofVerifier};
use crate::quest::events::QuestEvent;
use crate::quest::rules::QuestRules;
use crate::quest::settlement::{settle_player, Settlement};
use crate::quest::state::PlayerState;

// =============================================================================
// ERRORS
// =============================================================================

/// Why an envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The circuit predicate rejected the envelope.
    #[error("verification failed for {circuit}")]
    VerificationFailed {
        /// Circuit that rejected.
        circuit: CircuitId,
    },

    /// The envelope is bound to a different rules document.
    #[error("rules mismatch: expected {expected}, found {}", .found.as_deref().unwrap_or("nothing"))]
    RulesMismatch {
        /// Hash of the bound rules.
        expected: RulesHash,
        /// The envelope's `questHash`, when it is a string.
        found: Option<String>,
    },

    /// A nullifier was already consumed.
    #[error("nullifier reused: {token}")]
    NullifierReused {
        /// The offending token.
        token: String,
    },

    /// `deadline-v1` with `ok != 1`.
    #[error("deadline not met")]
    DeadlineNotMet,

    /// `oracle-fact-v1` with `ok != 1`.
    #[error("oracle fact not met for {oracle}")]
    OracleFactNotMet {
        /// Rendered `oracleId` signal.
        oracle: String,
    },

    /// The circuit tag is not recognized.
    #[error("unknown circuit: {0}")]
    UnknownCircuit(String),
}

impl SubmitError {
    /// Stable error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            SubmitError::RulesMismatch { .. } => ErrorKind::RulesMismatch,
            SubmitError::NullifierReused { .. } => ErrorKind::NullifierReused,
            SubmitError::DeadlineNotMet => ErrorKind::DeadlineNotMet,
            SubmitError::OracleFactNotMet { .. } => ErrorKind::OracleFactNotMet,
            SubmitError::UnknownCircuit(_) => ErrorKind::UnknownCircuit,
        }
    }
}

impl From<NullifierReused> for SubmitError {
    fn from(err: NullifierReused) -> Self {
        SubmitError::NullifierReused { token: err.token }
    }
}

/// Rejection kinds callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Predicate rejected the envelope.
    VerificationFailed,
    /// Bound to a different rules hash.
    RulesMismatch,
    /// Nullifier already consumed.
    NullifierReused,
    /// Deadline proof with `ok != 1`.
    DeadlineNotMet,
    /// Oracle proof with `ok != 1`.
    OracleFactNotMet,
    /// Unrecognized circuit.
    UnknownCircuit,
}

impl ErrorKind {
    /// SCREAMING_SNAKE code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::VerificationFailed => "VERIFICATION_FAILED",
            ErrorKind::RulesMismatch => "RULES_MISMATCH",
            ErrorKind::NullifierReused => "NULLIFIER_REUSED",
            ErrorKind::DeadlineNotMet => "DEADLINE_NOT_MET",
            ErrorKind::OracleFactNotMet => "ORACLE_FACT_NOT_MET",
            ErrorKind::UnknownCircuit => "UNKNOWN_CIRCUIT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Effect of an admitted envelope, decided before anything is written.
enum Effect {
    Milestone { met: bool, window: String },
    Event(QuestEvent),
}

/// A quest contract instance.
pub struct QuestContract {
    rules: QuestRules,
    config: SimulatorConfig,
    verifier: Box<dyn ProofVerifier>,
    nullifiers: NullifierRegistry,
    players: BTreeMap<String, PlayerState>,
}

impl fmt::Debug for QuestContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestContract")
            .field("rules_hash", &self.rules.hash())
            .field("nullifiers", &self.nullifiers.len())
            .field("players", &self.players.len())
            .finish()
    }
}

impl QuestContract {
    /// Create a contract using the signal predicates as verifier.
    pub fn new(rules: QuestRules, config: SimulatorConfig) -> Self {
        Self::with_verifier(rules, config, Box::new(PredicateVerifier))
    }

    /// Create a contract with a custom verifier.
    pub fn with_verifier(
        rules: QuestRules,
        config: SimulatorConfig,
        verifier: Box<dyn ProofVerifier>,
    ) -> Self {
        info!(
            rules_hash = %rules.hash(),
            windows = rules.timeline().windows_total(),
            "quest contract created"
        );
        Self {
            rules,
            config,
            verifier,
            nullifiers: NullifierRegistry::new(),
            players: BTreeMap::new(),
        }
    }

    /// Bound rules.
    pub fn rules(&self) -> &QuestRules {
        &self.rules
    }

    /// Hash envelopes must carry in `questHash`.
    pub fn rules_hash(&self) -> RulesHash {
        self.rules.hash()
    }

    /// Simulator settings.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Player state, without creating it.
    pub fn player(&self, address: &str) -> Option<&PlayerState> {
        self.players.get(address)
    }

    /// All players, ordered by address.
    pub fn players(&self) -> impl Iterator<Item = (&str, &PlayerState)> {
        self.players.iter().map(|(addr, p)| (addr.as_str(), p))
    }

    /// Has `token` been consumed?
    pub fn is_nullifier_consumed(&self, token: &str) -> bool {
        self.nullifiers.contains(token)
    }

    /// Number of consumed nullifiers.
    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    /// Admit one envelope for `address`.
    ///
    /// Returns the event appended to the player's log.
    pub fn submit_proof(
        &mut self,
        address: &str,
        envelope: &ProofEnvelope,
    ) -> Result<QuestEvent, SubmitError> {
        match self.admit(address, envelope) {
            Ok(event) => {
                info!(player = address, circuit = %envelope.circuit_id, %event, "proof accepted");
                Ok(event)
            }
            Err(err) => {
                warn!(
                    player = address,
                    circuit = %envelope.circuit_id,
                    kind = %err.kind(),
                    error = %err,
                    "proof rejected"
                );
                Err(err)
            }
        }
    }

    /// Settle `address`, creating the player if it has never submitted.
    ///
    /// May be called repeatedly; each call recomputes from current progress.
    pub fn settle(&mut self, address: &str) -> Settlement {
        self.settle_with_state(address).0
    }

    /// Settle `address` and return the settled player alongside the record.
    pub fn settle_with_state(&mut self, address: &str) -> (Settlement, &PlayerState) {
        let player = Self::player_entry(
            &mut self.players,
            address,
            &self.rules,
            &self.config,
        );
        let settlement = settle_player(player, &self.rules, &self.config);
        info!(
            player = address,
            eligible = settlement.eligible,
            total = settlement.total_reward,
            stake_return = settlement.stake_return,
            "player settled"
        );
        (settlement, player)
    }

    fn admit(&mut self, address: &str, envelope: &ProofEnvelope) -> Result<QuestEvent, SubmitError> {
        let circuit = CircuitId::from_tag(&envelope.circuit_id)
            .ok_or_else(|| SubmitError::UnknownCircuit(envelope.circuit_id.clone()))?;

        if !self.verifier.verify(circuit, envelope) {
            return Err(SubmitError::VerificationFailed { circuit });
        }

        let expected = self.rules.hash();
        match envelope.quest_hash() {
            Some(found) if expected.matches(found) => {}
            found => {
                return Err(SubmitError::RulesMismatch {
                    expected,
                    found: found.map(str::to_string),
                })
            }
        }

        self.nullifiers.check(&envelope.nullifiers)?;
        let effect = plan_effect(circuit, envelope)?;

        // Commit.
        self.nullifiers.consume(&envelope.nullifiers)?;
        let player = Self::player_entry(
            &mut self.players,
            address,
            &self.rules,
            &self.config,
        );
        let event = match effect {
            Effect::Milestone { met, window } => player.record_milestone(met, window),
            Effect::Event(event) => {
                player.push_event(event.clone());
                event
            }
        };

        Ok(event)
    }

    fn player_entry<'a>(
        players: &'a mut BTreeMap<String, PlayerState>,
        address: &str,
        rules: &QuestRules,
        config: &SimulatorConfig,
    ) -> &'a mut PlayerState {
        players.entry(address.to_string()).or_insert_with(|| {
            let windows_total = rules.timeline().windows_total();
            debug!(player = address, windows_total, "player created");
            PlayerState::new(config.default_stake, windows_total)
        })
    }
}

fn plan_effect(circuit: CircuitId, envelope: &ProofEnvelope) -> Result<Effect, SubmitError> {
    match circuit {
        CircuitId::CountThreshold => Ok(Effect::Milestone {
            met: envelope.signal_number("met", f64::NAN) == 1.0,
            window: envelope.signal_label("windowIndex"),
        }),
        CircuitId::Deadline => {
            if envelope.signal_number("ok", f64::NAN) != 1.0 {
                return Err(SubmitError::DeadlineNotMet);
            }
            Ok(Effect::Event(QuestEvent::DeadlineOk))
        }
        CircuitId::OracleFact => {
            let oracle = envelope.signal_label("oracleId");
            if envelope.signal_number("ok", f64::NAN) != 1.0 {
                return Err(SubmitError::OracleFactNotMet { oracle });
            }
            Ok(Effect::Event(QuestEvent::OracleOk { oracle }))
        }
    }
}
