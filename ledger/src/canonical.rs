//! Canonical JSON encoding for hash and signature payloads.
//!
//! The wire format used by HTTP handlers is ordinary `serde_json`, with
//! whatever key order `serde` happens to produce. Hashing and signing,
//! however, need a byte-for-byte deterministic encoding regardless of
//! field declaration order or serializer internals: keys sorted
//! alphabetically at every nesting level, no extraneous whitespace. This
//! module produces exactly that, for the two payload shapes the spec
//! hashes: a transaction's signing payload and a block's header payload.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rewrites `value` so every object is backed by a `BTreeMap`-equivalent
/// (alphabetically ordered) key set, recursively. Arrays are walked
/// element-wise; scalars pass through unchanged.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: BTreeMap<String, Value> = BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k.clone(), canonicalize(v));
            }
            let mut out = Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serializes `value` as canonical JSON bytes: keys sorted alphabetically
/// at every depth, compact (no inserted whitespace).
///
/// `serde_json::Map` preserves insertion order by default (the
/// `preserve_order` feature is not enabled for this crate), so inserting
/// keys in sorted order via a `BTreeMap` intermediate is sufficient to
/// guarantee the serialized byte order.
pub fn to_canonical_bytes(value: &Value) -> Vec<u8> {
    let canonical = canonicalize(value);
    serde_json::to_vec(&canonical).expect("canonical JSON values are always serializable")
}

/// Convenience wrapper returning the canonical bytes as a `String`.
pub fn to_canonical_string(value: &Value) -> String {
    String::from_utf8(to_canonical_bytes(value))
        .expect("serde_json never emits invalid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_top_level_keys() {
        let v = json!({"z": 1, "a": 2, "m": 3});
        assert_eq!(to_canonical_string(&v), r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn sorts_nested_object_keys() {
        let v = json!({"outer_z": {"b": 1, "a": 2}, "outer_a": 3});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"outer_a":3,"outer_z":{"a":2,"b":1}}"#
        );
    }

    #[test]
    fn sorts_keys_inside_arrays() {
        let v = json!({"items": [{"b": 1, "a": 2}, {"d": 3, "c": 4}]});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"items":[{"a":2,"b":1},{"c":4,"d":3}]}"#
        );
    }

    #[test]
    fn is_insensitive_to_source_field_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(to_canonical_bytes(&a), to_canonical_bytes(&b));
    }
}
