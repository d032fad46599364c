use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use quest_adjudicator::{
    canonicalize, rules_hash, ErrorKind, ProofEnvelope, QuestContract, QuestRules,
    SimulatorConfig, SubmitError,
};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(64);
    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        (-1_000_000i64..1_000_000, 0u32..7)
            .prop_map(|(m, e)| Value::from(m as f64 / 10f64.powi(e as i32))),
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        arb_number(),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(any::<String>(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Serialize an object with its top-level keys in the given order.
fn object_text(entries: &[(String, Value)]) -> String {
    let body: Vec<String> = entries
        .iter()
        .map(|(k, v)| {
            format!(
                "{}:{}",
                serde_json::to_string(k).unwrap(),
                serde_json::to_string(v).unwrap()
            )
        })
        .collect();
    format!("{{{}}}", body.join(","))
}

fn contract() -> QuestContract {
    let rules = QuestRules::from_value(serde_json::json!({
        "time": {
            "start": "2025-01-01T00:00:00Z",
            "end": "2025-01-29T00:00:00Z",
            "milestoneFrequency": { "windowDays": 7 }
        }
    }))
    .unwrap();
    QuestContract::new(rules, SimulatorConfig::default())
}

fn valid_envelope(circuit: u8, nullifiers: Vec<String>) -> ProofEnvelope {
    let env = match circuit % 3 {
        0 => ProofEnvelope::new("count-threshold-v1")
            .with_signal("met", 1)
            .with_signal("target", 1)
            .with_signal("windowIndex", 0),
        1 => ProofEnvelope::new("deadline-v1")
            .with_signal("ok", 1)
            .with_signal("submissionEpoch", 10)
            .with_signal("deadlineEpoch", 20),
        _ => ProofEnvelope::new("oracle-fact-v1")
            .with_signal("ok", 1)
            .with_signal("oracleId", "strava"),
    };
    nullifiers
        .into_iter()
        .fold(env, |env, token| env.with_nullifier(token))
}

proptest! {
    #![proptest_config(proptest_config())]
    #[test]
    fn canonicalization_is_idempotent(doc in arb_json()) {
        let once = canonicalize(&doc);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        prop_assert_eq!(canonicalize(&reparsed), once);
    }
}

proptest! {
    #![proptest_config(proptest_config())]
    #[test]
    fn hash_ignores_key_order(
        entries in prop::collection::btree_map("[a-zA-Z0-9_]{1,8}", arb_json(), 0..8)
    ) {
        let forward: Vec<(String, Value)> = entries.into_iter().collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a: Value = serde_json::from_str(&object_text(&forward)).unwrap();
        let b: Value = serde_json::from_str(&object_text(&reversed)).unwrap();
        prop_assert_eq!(rules_hash(&a), rules_hash(&b));
    }
}

proptest! {
    #![proptest_config(proptest_config())]
    #[test]
    fn shared_nullifier_is_rejected(
        first_circuit in any::<u8>(),
        second_circuit in any::<u8>(),
        extra in prop::collection::vec("[a-z]{4}", 0..4),
        position in any::<prop::sample::Index>(),
    ) {
        let mut qc = contract();
        let hash = qc.rules_hash();

        let first = valid_envelope(first_circuit, vec!["shared".to_string()]).bound_to(&hash);
        prop_assert!(qc.submit_proof("p1", &first).is_ok());

        let mut tokens: Vec<String> = extra.iter().map(|t| format!("x-{t}")).collect();
        tokens.insert(position.index(tokens.len() + 1), "shared".to_string());
        let second = valid_envelope(second_circuit, tokens.clone()).bound_to(&hash);

        let before = qc.nullifier_count();
        let err = qc.submit_proof("p2", &second).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::NullifierReused);
        prop_assert_eq!(qc.nullifier_count(), before);
        prop_assert!(qc.player("p2").is_none());
    }
}

proptest! {
    #![proptest_config(proptest_config())]
    #[test]
    fn foreign_hash_is_rejected(doc in arb_json(), circuit in any::<u8>()) {
        let mut qc = contract();
        let foreign = rules_hash(&doc);
        prop_assume!(foreign != qc.rules_hash());

        let env = valid_envelope(circuit, vec!["n".to_string()]).bound_to(&foreign);
        let err = qc.submit_proof("p", &env).unwrap_err();
        let mismatch = matches!(err, SubmitError::RulesMismatch { .. });
        prop_assert!(mismatch, "expected RulesMismatch, got {:?}", err);
        prop_assert!(!qc.is_nullifier_consumed("n"));
    }
}

proptest! {
    #![proptest_config(proptest_config())]
    #[test]
    fn unknown_circuit_never_mutates(tag in "[a-z]{3,10}-v[0-9]", ok in 0i64..2) {
        prop_assume!(tag != "deadline-v1");
        let mut qc = contract();
        let env = ProofEnvelope::new(tag.clone())
            .with_signal("ok", ok)
            .with_nullifier("n")
            .bound_to(&qc.rules_hash());

        prop_assert_eq!(qc.submit_proof("p", &env), Err(SubmitError::UnknownCircuit(tag)));
        prop_assert_eq!(qc.nullifier_count(), 0);
        prop_assert!(qc.player("p").is_none());
    }
}
