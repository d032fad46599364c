//! # Quest Adjudicator
//!
//! Off-chain reference model for quest adjudication: binds proofs to a rules
//! document by hash, admits proof envelopes, and computes a deterministic
//! payout at settlement.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    QUEST ADJUDICATOR                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                │
//! │  ├── canonical.rs - Canonical JSON encoding                 │
//! │  └── hash.rs      - BLAKE2b-256 rules hash                  │
//! │                                                             │
//! │  proof/           - Proof admission                         │
//! │  ├── envelope.rs  - Proof envelopes, signal coercion        │
//! │  ├── verify.rs    - Circuit predicates                      │
//! │  └── nullifier.rs - Replay protection                       │
//! │                                                             │
//! │  quest/           - Quest logic (deterministic)             │
//! │  ├── rules.rs     - Validated rules document                │
//! │  ├── state.rs     - Player state                            │
//! │  ├── events.rs    - Audit trail                             │
//! │  ├── ledger.rs    - Contract and submit_proof               │
//! │  └── settlement.rs- Eligibility and payout                  │
//! │                                                             │
//! │  host/            - Hosting (non-deterministic)             │
//! │  ├── service.rs   - Shared async contract handle            │
//! │  └── fixtures.rs  - Fixture files and flow runner           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `proof/` and `quest/` modules are deterministic:
//! - No HashMap (BTreeMap/BTreeSet for sorted iteration)
//! - No system time dependencies
//! - No randomness
//!
//! Given the same rules document and envelope sequence, any two runs
//! produce identical hashes, event logs and payouts.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod host;
pub mod proof;
pub mod quest;

// Re-export commonly used types
pub use config::SimulatorConfig;
pub use crate::core::{canonicalize, canonicalize_json, rules_hash, rules_hash_hex, RulesHash};
pub use host::QuestService;
pub use proof::{verify_envelope, CircuitId, NullifierRegistry, ProofEnvelope, ProofVerifier};
pub use quest::{
    ErrorKind, PayoutMode, PlayerState, QuestContract, QuestEvent, QuestRules, RulesError,
    Settlement, SubmitError,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
