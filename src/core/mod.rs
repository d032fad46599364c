//! Core deterministic primitives.
//!
//! Everything the rules hash depends on lives here. Two honest
//! implementations must agree on these byte-for-byte.

pub mod canonical;
pub mod hash;

// Re-export core types
pub use canonical::{canonicalize, canonicalize_json, canonicalize_serialize};
pub use hash::{rules_hash, rules_hash_hex, RulesHash, RulesHashParseError};
