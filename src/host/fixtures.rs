//! Fixture loading and the end-to-end flow runner.
//!
//! A flow loads a rules document and a proof batch, submits every envelope
//! for the batch's player, then settles that player.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SimulatorConfig;
use crate::proof::envelope::ProofEnvelope;
use crate::quest::ledger::{QuestContract, SubmitError};
use crate::quest::rules::{QuestRules, RulesError};
use crate::quest::settlement::Settlement;
use crate::quest::state::PlayerState;

/// Fixture errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Proof batch is not valid.
    #[error("invalid proof batch {path}: {source}")]
    Batch {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Rules document is not valid.
    #[error("invalid rules document {path}: {source}")]
    Rules {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: RulesError,
    },

    /// An envelope was rejected and the run stops on rejection.
    #[error("submission {index} rejected: {source}")]
    Rejected {
        /// Position in the batch.
        index: usize,
        /// Rejection reason.
        source: SubmitError,
    },
}

/// Proofs file: one player and the envelopes they submit, in order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofBatch {
    /// Player address.
    pub player: String,
    /// Envelopes in submission order.
    #[serde(default)]
    pub submissions: Vec<ProofEnvelope>,
}

/// A rejected submission when the run keeps going.
#[derive(Clone, Debug, PartialEq)]
pub struct Rejection {
    /// Position in the batch.
    pub index: usize,
    /// Rejection reason.
    pub error: SubmitError,
}

/// Result of a completed flow.
#[derive(Clone, Debug)]
pub struct FlowOutcome {
    /// Player address.
    pub player: String,
    /// Accepted envelope count.
    pub accepted: usize,
    /// Rejected envelopes, empty unless the run keeps going.
    pub rejected: Vec<Rejection>,
    /// Settlement of the player.
    pub settlement: Settlement,
    /// Final player state.
    pub state: PlayerState,
}

/// Load and validate a rules document.
pub fn load_rules(path: impl AsRef<Path>) -> Result<QuestRules, FixtureError> {
    let path = path.as_ref();
    let text = read(path)?;
    QuestRules::from_json_str(&text).map_err(|source| FixtureError::Rules {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a proof batch.
pub fn load_batch(path: impl AsRef<Path>) -> Result<ProofBatch, FixtureError> {
    let path = path.as_ref();
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| FixtureError::Batch {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, FixtureError> {
    fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Submit a batch, then settle its player.
///
/// With `keep_going` unset the first rejection aborts the run; earlier
/// accepted envelopes stay applied to `contract`.
pub fn run_flow(
    contract: &mut QuestContract,
    mut batch: ProofBatch,
    keep_going: bool,
) -> Result<FlowOutcome, FixtureError> {
    let hash = contract.rules_hash();
    let resolve = contract.config().resolve_placeholders;
    let player = batch.player.clone();

    let mut accepted = 0;
    let mut rejected = Vec::new();

    for (index, envelope) in batch.submissions.iter_mut().enumerate() {
        if resolve && envelope.resolve_quest_hash_placeholder(&hash) {
            debug!(index, "questHash placeholder resolved");
        }

        match contract.submit_proof(&player, envelope) {
            Ok(_) => accepted += 1,
            Err(source) if !keep_going => {
                return Err(FixtureError::Rejected { index, source });
            }
            Err(error) => {
                warn!(index, %error, "continuing past rejected submission");
                rejected.push(Rejection { index, error });
            }
        }
    }

    let (settlement, state) = contract.settle_with_state(&player);
    let state = state.clone();

    info!(
        player = %player,
        accepted,
        rejected = rejected.len(),
        "flow complete"
    );

    Ok(FlowOutcome {
        player,
        accepted,
        rejected,
        settlement,
        state,
    })
}

/// Load both fixture files and run a fresh contract over them.
pub fn run_files(
    rules_path: impl AsRef<Path>,
    proofs_path: impl AsRef<Path>,
    config: SimulatorConfig,
    keep_going: bool,
) -> Result<FlowOutcome, FixtureError> {
    let rules = load_rules(rules_path)?;
    let batch = load_batch(proofs_path)?;
    let mut contract = QuestContract::new(rules, config);
    run_flow(&mut contract, batch, keep_going)
}
