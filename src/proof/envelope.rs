//! Proof Envelopes
//!
//! The untrusted submission format. Only `circuitId`, `publicSignals` and
//! `nullifiers` are interpreted; every other field is carried through
//! untouched for a real verifier.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::core::canonical::format_number;
use crate::core::hash::RulesHash;

/// Open mapping from signal name to value. Semantics are per circuit.
pub type PublicSignals = Map<String, Value>;

/// Signal carrying the rules hash an envelope is bound to.
pub const QUEST_HASH_SIGNAL: &str = "questHash";

/// Prefix of an unresolved questHash placeholder in fixtures.
pub const QUEST_HASH_PLACEHOLDER_PREFIX: &str = "<0x";

/// A proof envelope as submitted by a player.
///
/// Passthrough fields are kept as raw JSON: whatever a client sent,
/// including an explicit `null`, serializes back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEnvelope {
    /// Circuit tag selecting the predicate.
    pub circuit_id: String,

    /// Public signals.
    #[serde(default)]
    pub public_signals: PublicSignals,

    /// One-time replay-prevention tokens.
    #[serde(default)]
    pub nullifiers: Vec<String>,

    /// Passthrough: verification key identifier.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub vk_id: Option<Value>,

    /// Passthrough: serialized proof.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,

    /// Passthrough: Merkle roots the proof commits to.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub merkle_roots: Option<Value>,

    /// Passthrough: submission nonce.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Value>,

    /// Passthrough: client-side timestamp.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timestamp_hint: Option<Value>,

    /// Passthrough: aggregated signatures.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub sig_aggregates: Option<Value>,
}

/// A field that is present, even as `null`, is `Some`. Absent fields take
/// the `None` default.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ProofEnvelope {
    /// Create an envelope for a circuit with no signals or nullifiers.
    pub fn new(circuit_id: impl Into<String>) -> Self {
        Self {
            circuit_id: circuit_id.into(),
            public_signals: PublicSignals::new(),
            nullifiers: Vec::new(),
            vk_id: None,
            proof: None,
            merkle_roots: None,
            nonce: None,
            timestamp_hint: None,
            sig_aggregates: None,
        }
    }

    /// Set a public signal.
    pub fn with_signal(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.public_signals.insert(key.to_string(), value.into());
        self
    }

    /// Append a nullifier.
    pub fn with_nullifier(mut self, token: impl Into<String>) -> Self {
        self.nullifiers.push(token.into());
        self
    }

    /// Bind the envelope to a rules hash.
    pub fn bound_to(self, hash: &RulesHash) -> Self {
        self.with_signal(QUEST_HASH_SIGNAL, hash.to_hex())
    }

    /// Raw signal value.
    pub fn signal(&self, key: &str) -> Option<&Value> {
        self.public_signals.get(key)
    }

    /// Signal coerced to a number; `default` when missing or null.
    pub fn signal_number(&self, key: &str, default: f64) -> f64 {
        match self.signal(key) {
            None | Some(Value::Null) => default,
            Some(value) => coerce_number(value),
        }
    }

    /// Signal rendered as text for event labels.
    pub fn signal_label(&self, key: &str) -> String {
        match self.signal(key) {
            None => "undefined".to_string(),
            Some(value) => display_value(value),
        }
    }

    /// The bound rules hash, if the signal is a string.
    pub fn quest_hash(&self) -> Option<&str> {
        self.signal(QUEST_HASH_SIGNAL).and_then(Value::as_str)
    }

    /// Is `questHash` an unresolved `<0x...` fixture placeholder?
    pub fn has_quest_hash_placeholder(&self) -> bool {
        self.quest_hash()
            .map(|h| h.starts_with(QUEST_HASH_PLACEHOLDER_PREFIX))
            .unwrap_or(false)
    }

    /// Replace a `<0x...` placeholder with the real hash.
    ///
    /// Returns whether a substitution happened. A real hash, or any other
    /// value, is left alone.
    pub fn resolve_quest_hash_placeholder(&mut self, hash: &RulesHash) -> bool {
        if !self.has_quest_hash_placeholder() {
            return false;
        }
        self.public_signals
            .insert(QUEST_HASH_SIGNAL.to_string(), Value::String(hash.to_hex()));
        true
    }
}

// =============================================================================
// SIGNAL COERCION
// =============================================================================

/// Coerce a signal value to a number.
///
/// Booleans map to 0/1, null to 0, numeric strings parse (with `0x`/`0o`/`0b`
/// radix prefixes and `Infinity`), empty strings to 0. Anything else is NaN,
/// which fails every comparison.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric_str(s),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn parse_numeric_str(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }

    let radix = match t.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return t
            .get(2..)
            .and_then(|digits| u64::from_str_radix(digits, radix).ok())
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust's float parser also takes "inf" and "nan"; signals may not.
    let numeric = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Render a value the way it reads inside an event label.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
