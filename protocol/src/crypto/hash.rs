//! # Hashing Utilities
//!
//! BLAKE3 is the only hash the notary uses. Block digests are computed over
//! a byte preimage assembled in `storage::block`; this module provides the
//! raw hash functions plus the canonical JSON encoding payloads go through
//! before they land in that preimage.
//!
//! ## Canonical JSON
//!
//! Payloads are arbitrary `serde_json::Value`s. Two clients can send the same
//! logical object with keys in different orders, and whether `serde_json`
//! keeps insertion order depends on a cargo feature some other crate in the
//! build graph might switch on. So we never hash `serde_json::to_vec` output
//! directly. [`canonical_json`] writes compact JSON with object keys sorted
//! at every depth, which is stable no matter how the map was built.

use serde_json::Value;

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use notary_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"star notary");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte slices together without concatenating them first.
///
/// Equivalent to `blake3_hash(&parts.concat())`.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Render a JSON value in canonical form: compact, object keys sorted
/// lexicographically at every nesting level.
///
/// Scalars use `serde_json`'s own formatting, so strings are escaped exactly
/// as `serde_json::to_string` would escape them.
///
/// ```
/// use notary_protocol::crypto::canonical_json;
/// use serde_json::json;
///
/// let value = json!({ "b": 1, "a": { "d": [true, null], "c": "x" } });
/// assert_eq!(canonical_json(&value), r#"{"a":{"c":"x","d":[true,null]},"b":1}"#);
/// ```
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
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
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"polaris"), blake3_hash(b"polaris"));
        assert_ne!(blake3_hash(b"polaris"), blake3_hash(b"vega"));
    }

    #[test]
    fn blake3_multi_matches_concatenation() {
        let parts: [&[u8]; 3] = [b"alpha", b"", b"centauri"];
        assert_eq!(blake3_hash_multi(&parts), blake3_hash(b"alphacentauri"));
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let a: Value = serde_json::from_str(r#"{"star":{"ra":"02h31m","dec":"89deg"},"name":"Polaris"}"#)
            .unwrap();
        let b: Value = serde_json::from_str(r#"{"name":"Polaris","star":{"dec":"89deg","ra":"02h31m"}}"#)
            .unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(
            canonical_json(&a),
            r#"{"name":"Polaris","star":{"dec":"89deg","ra":"02h31m"}}"#
        );
    }

    #[test]
    fn canonical_json_preserves_array_order() {
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn canonical_json_escapes_strings() {
        let value = json!({ "story": "line \"one\"\nline two" });
        assert_eq!(
            canonical_json(&value),
            r#"{"story":"line \"one\"\nline two"}"#
        );
    }

    #[test]
    fn canonical_json_scalars() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(42)), "42");
        assert_eq!(canonical_json(&json!("Genesis Block")), "\"Genesis Block\"");
    }
}
