//! Content hashing for catalog payloads.
//!
//! Digests are computed over a canonical JSON form (recursively key-sorted,
//! no insignificant whitespace), so two semantically equal payloads hash
//! identically regardless of the key order or formatting of the snapshot
//! they arrived in. Hash churn from serialization differences would
//! misclassify unchanged items as updates.

use std::fmt::Write as _;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the content digest of a payload.
///
/// Deterministic and independent of key insertion order. Infallible: every
/// `serde_json::Value` has a canonical form.
pub fn hash_item(payload: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(payload, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the aggregate digest over a set of `(external_id, digest)` pairs.
///
/// Pairs are sorted by `external_id` before folding, so the result is
/// independent of input ordering. An empty set has a well-defined digest
/// (the hash of no input).
pub fn aggregate_hash<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: Vec<(&str, &str)> = pairs.into_iter().collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (external_id, digest) in sorted {
        // NUL separators keep (ab, c) and (a, bc) from folding identically.
        hasher.update(external_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(digest.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Serialize a value to its canonical JSON form: object keys sorted
/// ascending, arrays in order, minimal whitespace.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                // Key came out of the map above.
                if let Some(child) = map.get(*key) {
                    write_canonical(child, out);
                }
            }
            out.push('}');
        }
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
