//! Quest Domain
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUEST                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rules.rs      - Typed, validated rules document            │
//! │  state.rs      - Per-player progress                        │
//! │  events.rs     - Audit trail records                        │
//! │  ledger.rs     - QuestContract and submit_proof             │
//! │  settlement.rs - Eligibility and PPC payout                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod events;
pub mod ledger;
pub mod rules;
pub mod settlement;
pub mod state;

// Re-export key types
pub use events::QuestEvent;
pub use ledger::{ErrorKind, QuestContract, SubmitError};
pub use rules::{PayoutMode, QuestRules, RulesError};
pub use settlement::{round2, Settlement};
pub use state::{PlayerState, QuestPhase};
