//! Host Layer (non-deterministic)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         HOST                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  service.rs  - Shared async handle over one contract        │
//! │  fixtures.rs - Rules/proof file loading, end-to-end flow    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod fixtures;
pub mod service;

// Re-export key types
pub use fixtures::{
    load_batch, load_rules, run_files, run_flow, FixtureError, FlowOutcome, ProofBatch, Rejection,
};
pub use service::QuestService;
