//! Rules Hashing
//!
//! BLAKE2b (256-bit digest) over the canonical encoding of a rules document.
//! The hex form `0x` + 64 lowercase hex chars is what proof envelopes carry in
//! `publicSignals.questHash`.

use std::fmt;
use std::str::FromStr;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use super::canonical::canonicalize;

/// BLAKE2b with a 32-byte output.
pub type Blake2b256 = Blake2b<U32>;

/// Hash output type (256 bits / 32 bytes)
pub type Digest32 = [u8; 32];

/// Prefix of the textual hash form.
pub const HASH_PREFIX: &str = "0x";

/// Incremental hasher for canonical payloads.
pub struct RulesHasher {
    hasher: Blake2b256,
}

impl RulesHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self {
            hasher: Blake2b256::new(),
        }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with the UTF-8 bytes of a string.
    #[inline]
    pub fn update_str(&mut self, s: &str) {
        self.hasher.update(s.as_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest32 {
        self.hasher.finalize().into()
    }
}

impl Default for RulesHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a BLAKE2b-256 digest of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> Digest32 {
    let mut hasher = RulesHasher::new();
    hasher.update_bytes(data);
    hasher.finalize()
}

/// Digest binding proofs to one exact rules document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RulesHash(Digest32);

impl RulesHash {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: Digest32) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &Digest32 {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("{}{}", HASH_PREFIX, hex::encode(self.0))
    }

    /// Does `candidate` spell exactly this hash?
    ///
    /// Exact string comparison: an uppercase or unprefixed spelling of the
    /// same digest does not match.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate == self.to_hex()
    }
}

impl fmt::Display for RulesHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RulesHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RulesHash({})", self.to_hex())
    }
}

/// Errors parsing the textual hash form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesHashParseError {
    /// Missing `0x` prefix.
    #[error("rules hash must start with 0x")]
    MissingPrefix,
    /// Not valid hex.
    #[error("invalid hex in rules hash: {0}")]
    InvalidHex(String),
    /// Wrong digest length.
    #[error("rules hash must be 32 bytes, got {0}")]
    WrongLength(usize),
}

impl FromStr for RulesHash {
    type Err = RulesHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(HASH_PREFIX)
            .ok_or(RulesHashParseError::MissingPrefix)?;
        let bytes = hex::decode(body).map_err(|e| RulesHashParseError::InvalidHex(e.to_string()))?;
        let digest: Digest32 = bytes
            .as_slice()
            .try_into()
            .map_err(|_| RulesHashParseError::WrongLength(bytes.len()))?;
        Ok(Self(digest))
    }
}

impl Serialize for RulesHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RulesHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash a rules document: BLAKE2b-256 over its canonical UTF-8 encoding.
pub fn rules_hash(doc: &Value) -> RulesHash {
    let canonical = canonicalize(doc);
    let mut hasher = RulesHasher::new();
    hasher.update_str(&canonical);
    RulesHash(hasher.finalize())
}

/// Hash a rules document and return the `0x`-prefixed hex form.
pub fn rules_hash_hex(doc: &Value) -> String {
    rules_hash(doc).to_hex()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_digest() {
        let hash = rules_hash(&json!({}));
        assert_eq!(
            hash.to_hex(),
            "0xc09da522dac261c3d2566230bed10d2f3ef13f8e7654576c12e857e07f786098"
        );
        assert_eq!(hash.as_bytes(), &hash_bytes(b"{}"));

        assert_eq!(
            rules_hash_hex(&json!({ "a": 1.0 })),
            "0x10a7ff3e312baec0c356be489739b93f63af84416c40f1c13023eb96c7ed50aa"
        );
    }

    #[test]
    fn test_hex_format() {
        let hex = rules_hash_hex(&json!({ "a": 1 }));
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert!(hex[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_order_independent() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":{"q":[1,2],"p":null}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":{"p":null,"q":[1,2]},"x":1}"#).unwrap();
        assert_eq!(rules_hash(&a), rules_hash(&b));
    }

    #[test]
    fn test_structural_difference_changes_hash() {
        let a = json!({ "pool": { "amount": 10000 } });
        let b = json!({ "pool": { "amount": 10001 } });
        let c = json!({ "pool": [{ "amount": 10000 }] });
        assert_ne!(rules_hash(&a), rules_hash(&b));
        assert_ne!(rules_hash(&a), rules_hash(&c));
    }

    #[test]
    fn test_array_order_matters() {
        assert_ne!(rules_hash(&json!([1, 2])), rules_hash(&json!([2, 1])));
    }

    #[test]
    fn test_parse_roundtrip() {
        let hash = rules_hash(&json!({ "k": "v" }));
        let parsed: RulesHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);
        assert!(hash.matches(&hash.to_hex()));
        assert!(!hash.matches(&hash.to_hex().to_uppercase()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "abcd".parse::<RulesHash>(),
            Err(RulesHashParseError::MissingPrefix)
        );
        assert!(matches!(
            "0xzz".parse::<RulesHash>(),
            Err(RulesHashParseError::InvalidHex(_))
        ));
        assert_eq!(
            "0xabcd".parse::<RulesHash>(),
            Err(RulesHashParseError::WrongLength(2))
        );
    }
}
