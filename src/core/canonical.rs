//! Canonical JSON Encoding
//!
//! Produces the single byte string that stands for a logical JSON document:
//! - Object keys sorted at every nesting level (UTF-16 code unit order)
//! - Array element order preserved
//! - Numbers in shortest round-trip form, integral values without a fraction
//! - No insignificant whitespace
//!
//! The output is the preimage of the rules hash. Changing anything here
//! invalidates every proof bound to an existing rules document.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Largest integer a double represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Encode a document canonically.
///
/// Never fails: every `Value` has a canonical form. Non-finite numbers cannot
/// live inside a `Value` (serde_json maps them to `null` on conversion), so
/// they surface here as `null`. A field that is absent is simply not present
/// in the map and is therefore not emitted.
pub fn canonicalize(doc: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, doc);
    out
}

/// Parse JSON text and encode it canonically.
pub fn canonicalize_json(text: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(canonicalize(&value))
}

/// Encode any serializable document canonically.
///
/// Fields skipped by `skip_serializing_if` are absent from the output;
/// non-finite floats become `null`.
pub fn canonicalize_serialize<T>(doc: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(doc)?;
    Ok(canonicalize(&value))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

/// Key order used by the encoder.
///
/// Compares UTF-16 code units rather than bytes, so characters outside the
/// Basic Multilingual Plane sort before U+E000..U+FFFF.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

// =============================================================================
// NUMBER NORMALIZATION
// =============================================================================

/// Render a JSON number in canonical form.
///
/// Integers within the exact double range print as integers. Anything larger
/// goes through its double value, which is what every JSON-number consumer
/// on the other side of the hash will see.
pub fn format_number(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        if u <= MAX_SAFE_INTEGER {
            return u.to_string();
        }
    } else if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return i.to_string();
        }
    }

    match n.as_f64() {
        Some(f) => format_f64(f),
        None => "null".to_string(),
    }
}

/// Render a double as the shortest decimal that round-trips.
///
/// Plain notation for decimal exponents in `-7 < n <= 21`, exponent notation
/// (`1e+21`, `1.5e-7`) outside it. `-0` prints as `0`.
pub fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };

    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-7" or "6e3".
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        let mut s = digits;
        s.extend(std::iter::repeat('0').take((n - k) as usize));
        s
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        let zeros: String = std::iter::repeat('0').take((-n) as usize).collect();
        format!("0.{}{}", zeros, digits)
    } else {
        let e = n - 1;
        let exp = if e >= 0 {
            format!("e+{}", e)
        } else {
            format!("e-{}", -e)
        };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}{}", lead, exp)
        } else {
            format!("{}.{}{}", lead, rest, exp)
        }
    };

    format!("{}{}", sign, body)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sorts_keys_at_every_level() {
        let doc = json!({
            "b": 1,
            "a": [3, 1, { "d": null, "c": true }],
        });

        assert_eq!(
            canonicalize(&doc),
            r#"{"a":[3,1,{"c":true,"d":null}],"b":1}"#
        );
    }

    #[test]
    fn test_no_whitespace() {
        let text = "{ \"x\" : [ 1 , 2 ] ,\n \"y\" : \"a b\" }";
        assert_eq!(canonicalize_json(text).unwrap(), r#"{"x":[1,2],"y":"a b"}"#);
    }

    #[test]
    fn test_non_finite_becomes_null() {
        let doc = json!({ "nan": f64::NAN, "inf": f64::INFINITY, "ok": 1.5 });
        assert_eq!(canonicalize(&doc), r#"{"inf":null,"nan":null,"ok":1.5}"#);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        #[derive(Serialize)]
        struct Doc {
            present: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            missing: Option<u32>,
            weight: f64,
        }

        let doc = Doc {
            present: 1,
            missing: None,
            weight: f64::NEG_INFINITY,
        };
        assert_eq!(
            canonicalize_serialize(&doc).unwrap(),
            r#"{"present":1,"weight":null}"#
        );
    }

    #[test]
    fn test_key_order_uses_utf16_units() {
        // U+1F600 encodes as a surrogate pair starting 0xD83D, below U+FF61.
        let doc = json!({ "\u{ff61}": 1, "\u{1f600}": 2 });
        assert_eq!(canonicalize(&doc), "{\"\u{1f600}\":2,\"\u{ff61}\":1}");
    }

    #[test]
    fn test_string_escapes() {
        let doc = json!("quote\" slash\\ nl\n tab\t bell\u{07} é");
        assert_eq!(
            canonicalize(&doc),
            "\"quote\\\" slash\\\\ nl\\n tab\\t bell\\u0007 é\""
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(-0.0), "0");
        assert_eq!(format_f64(0.5), "0.5");
        assert_eq!(format_f64(123456.789), "123456.789");
        assert_eq!(format_f64(0.000001), "0.000001");
        assert_eq!(format_f64(1e-7), "1e-7");
        assert_eq!(format_f64(1.5e-7), "1.5e-7");
        assert_eq!(format_f64(1e21), "1e+21");
        assert_eq!(format_f64(1e20), "100000000000000000000");
        assert_eq!(format_f64(-2.5e300), "-2.5e+300");
        assert_eq!(format_f64(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_large_integers_go_through_double() {
        let doc: Value = serde_json::from_str("[9007199254740991, 9007199254740993, -42]").unwrap();
        assert_eq!(canonicalize(&doc), "[9007199254740991,9007199254740992,-42]");
    }

    #[test]
    fn test_integral_floats_print_as_integers() {
        let doc: Value = serde_json::from_str(r#"{"amount": 10000.0, "pct": 75.50}"#).unwrap();
        assert_eq!(canonicalize(&doc), r#"{"amount":10000,"pct":75.5}"#);
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let doc = json!({
            "z": [1.25e-9, 3e25, "s"],
            "a": { "k": false, "j": [ { "y": 0.1, "x": -7 } ] },
        });
        let once = canonicalize(&doc);
        let twice = canonicalize_json(&once).unwrap();
        assert_eq!(once, twice);
    }
}
