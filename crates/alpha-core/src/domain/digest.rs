//! Canonical JSON and SHA-256 hashing for audit entries.
//!
//! Canonical form: object keys in UTF-16 code unit order, integer-valued
//! floats written as integers, NaN/Infinity rejected, compact output. Two
//! values that compare equal after a JSON round trip always hash the same.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::domain::error::{GovernanceError, Result};

/// Prior hash used by the first entry of every chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

fn canonicalize(value: &Value) -> Result<Value> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            let mut sorted = Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), canonicalize(v)?);
                }
            }
            Ok(Value::Object(sorted))
        }
        Value::Array(items) => items
            .iter()
            .map(canonicalize)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Number(n) => canonical_number(n).map(Value::Number),
        other => Ok(other.clone()),
    }
}

fn canonical_number(n: &Number) -> Result<Number> {
    if n.is_i64() || n.is_u64() {
        return Ok(n.clone());
    }
    let Some(f) = n.as_f64() else {
        return Ok(n.clone());
    };
    if !f.is_finite() {
        return Err(GovernanceError::Canonicalization(
            "NaN/Infinity not permitted in canonical JSON".to_string(),
        ));
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Ok(Number::from(f as i64))
    } else {
        Ok(n.clone())
    }
}

/// Canonical compact JSON text for `value`.
///
/// Without serde_json's `preserve_order` feature the map re-sorts by UTF-8
/// byte order on insert. That agrees with UTF-16 order for every key this
/// crate writes (ASCII only).
pub fn canonical_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&canonicalize(value)?)?)
}

/// SHA-256 of raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of the canonical JSON form of `value`.
pub fn compute_digest(value: &Value) -> Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Hash linking an entry to its predecessor: `H(prior_hash ∥ canonical(fields))`.
pub fn chain_digest(prior_hash: &str, fields: &Value) -> Result<String> {
    let canonical = canonical_json(fields)?;
    let mut hasher = Sha256::new();
    hasher.update(prior_hash.as_bytes());
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_digest() {
        let a = json!({"actor": "desk", "action": "submit_signal", "n": 1});
        let b = json!({"n": 1, "action": "submit_signal", "actor": "desk"});
        assert_eq!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
    }

    #[test]
    fn integer_valued_float_is_normalized() {
        assert_eq!(canonical_json(&json!({"edge": 2.0})).unwrap(), r#"{"edge":2}"#);
        assert_eq!(canonical_json(&json!({"edge": 2.5})).unwrap(), r#"{"edge":2.5}"#);
    }

    #[test]
    fn nested_objects_are_sorted() {
        let v = json!({"z": {"b": 1, "a": [ {"d": 0, "c": 0} ]}, "a": null});
        assert_eq!(
            canonical_json(&v).unwrap(),
            r#"{"a":null,"z":{"a":[{"c":0,"d":0}],"b":1}}"#
        );
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chain_digest_depends_on_prior_hash() {
        let fields = json!({"sequence": 1, "action": "log"});
        let from_genesis = chain_digest(GENESIS_HASH, &fields).unwrap();
        let from_other = chain_digest(&sha256_hex(b"other"), &fields).unwrap();
        assert_ne!(from_genesis, from_other);
        assert_eq!(from_genesis.len(), 64);
    }
}
