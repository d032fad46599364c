//! Nullifier Registry
//!
//! One-time replay tokens. A batch is consumed all-or-nothing: either every
//! token in it is fresh and all of them are recorded, or none is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A token that was already consumed (or repeated within its own batch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("nullifier already consumed: {token}")]
pub struct NullifierReused {
    /// The offending token.
    pub token: String,
}

/// Registry of consumed nullifiers for one contract instance.
///
/// Grows monotonically; there is no removal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NullifierRegistry {
    consumed: BTreeSet<String>,
}

impl NullifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consumed tokens.
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// Has nothing been consumed yet?
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    /// Is `token` consumed?
    pub fn contains(&self, token: &str) -> bool {
        self.consumed.contains(token)
    }

    /// Consumed tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.consumed.iter().map(String::as_str)
    }

    /// Would `tokens` be accepted? Does not mutate.
    ///
    /// A token repeated inside the batch counts as reuse.
    pub fn check(&self, tokens: &[String]) -> Result<(), NullifierReused> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for token in tokens {
            if self.consumed.contains(token) || !seen.insert(token.as_str()) {
                return Err(NullifierReused {
                    token: token.clone(),
                });
            }
        }
        Ok(())
    }

    /// Consume a batch atomically.
    pub fn consume(&mut self, tokens: &[String]) -> Result<(), NullifierReused> {
        self.check(tokens)?;
        for token in tokens {
            self.consumed.insert(token.clone());
        }
        debug!(count = tokens.len(), total = self.consumed.len(), "nullifiers consumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_consume_fresh_batch() {
        let mut registry = NullifierRegistry::new();
        registry.consume(&batch(&["a", "b"])).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert!(registry.contains("b"));
    }

    #[test]
    fn test_reuse_rejected() {
        let mut registry = NullifierRegistry::new();
        registry.consume(&batch(&["a"])).unwrap();

        let err = registry.consume(&batch(&["a"])).unwrap_err();
        assert_eq!(err.token, "a");
    }

    #[test]
    fn test_failed_batch_inserts_nothing() {
        let mut registry = NullifierRegistry::new();
        registry.consume(&batch(&["b"])).unwrap();

        // "a" precedes the reused "b"; it must not be left behind.
        let err = registry.consume(&batch(&["a", "b", "c"])).unwrap_err();
        assert_eq!(err.token, "b");
        assert!(!registry.contains("a"));
        assert!(!registry.contains("c"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_within_batch() {
        let mut registry = NullifierRegistry::new();
        let err = registry.consume(&batch(&["x", "y", "x"])).unwrap_err();
        assert_eq!(err.token, "x");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_batch_is_accepted() {
        let mut registry = NullifierRegistry::new();
        registry.consume(&[]).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_iter_sorted() {
        let mut registry = NullifierRegistry::new();
        registry.consume(&batch(&["z", "m", "a"])).unwrap();
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec!["a", "m", "z"]);
    }
}
