//! Proof Admission
//!
//! Everything an envelope passes through before it may touch player state:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF ADMISSION                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  envelope.rs  - Untrusted submission format, signal coercion│
//! │  verify.rs    - Circuit predicates, ProofVerifier seam      │
//! │  nullifier.rs - All-or-nothing replay protection            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod envelope;
pub mod nullifier;
pub mod verify;

// Re-export key types
pub use envelope::{ProofEnvelope, PublicSignals};
pub use nullifier::{NullifierRegistry, NullifierReused};
pub use verify::{check_predicate, verify_envelope, CircuitId, PredicateVerifier, ProofVerifier};
