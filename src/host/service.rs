//! Shared Contract Handle
//!
//! Lets many tasks submit against one contract instance. A single async
//! mutex serializes whole operations, so a nullifier check-and-insert and
//! the player mutation that follows it are one critical section.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::hash::RulesHash;
use crate::proof::envelope::ProofEnvelope;
use crate::quest::events::QuestEvent;
use crate::quest::ledger::{QuestContract, SubmitError};
use crate::quest::settlement::Settlement;
use crate::quest::state::PlayerState;

/// Cloneable handle to one contract instance.
#[derive(Clone, Debug)]
pub struct QuestService {
    contract: Arc<Mutex<QuestContract>>,
    rules_hash: RulesHash,
}

impl QuestService {
    /// Wrap a contract.
    pub fn new(contract: QuestContract) -> Self {
        let rules_hash = contract.rules_hash();
        Self {
            contract: Arc::new(Mutex::new(contract)),
            rules_hash,
        }
    }

    /// Hash envelopes must be bound to. Fixed for the instance, so no lock.
    pub fn rules_hash(&self) -> RulesHash {
        self.rules_hash
    }

    /// Admit one envelope.
    pub async fn submit_proof(
        &self,
        address: &str,
        envelope: &ProofEnvelope,
    ) -> Result<QuestEvent, SubmitError> {
        let mut contract = self.contract.lock().await;
        contract.submit_proof(address, envelope)
    }

    /// Settle a player.
    pub async fn settle(&self, address: &str) -> Settlement {
        let mut contract = self.contract.lock().await;
        contract.settle(address)
    }

    /// Snapshot of a player's state.
    pub async fn player(&self, address: &str) -> Option<PlayerState> {
        let contract = self.contract.lock().await;
        contract.player(address).cloned()
    }

    /// Number of consumed nullifiers.
    pub async fn nullifier_count(&self) -> usize {
        self.contract.lock().await.nullifier_count()
    }

    /// Run a read-only closure against the contract.
    pub async fn inspect<R>(&self, f: impl FnOnce(&QuestContract) -> R) -> R {
        let contract = self.contract.lock().await;
        f(&contract)
    }
}
