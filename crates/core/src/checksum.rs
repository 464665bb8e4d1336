//! Raw-record checksums.
//!
//! A mapping entry stores a checksum of the raw record it was created
//! from, so that a later run can tell whether the source row changed
//! since the mapping was minted. The checksum must be independent of the
//! key order the source system happened to emit.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the sha-256 hex digest of a JSON value in canonical form
/// (object keys sorted recursively).
pub fn record_checksum(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys are serialized as JSON strings to keep escaping stable.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
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
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checksum_is_stable() {
        let record = json!({"id": "12", "name": "Shoes"});
        assert_eq!(record_checksum(&record), record_checksum(&record));
    }

    #[test]
    fn checksum_ignores_key_order() {
        let a = json!({"id": "12", "name": "Shoes", "nested": {"x": 1, "y": 2}});
        let b = json!({"nested": {"y": 2, "x": 1}, "name": "Shoes", "id": "12"});
        assert_eq!(record_checksum(&a), record_checksum(&b));
    }

    #[test]
    fn checksum_detects_value_change() {
        let a = json!({"id": "12", "name": "Shoes"});
        let b = json!({"id": "12", "name": "Boots"});
        assert_ne!(record_checksum(&a), record_checksum(&b));
    }

    #[test]
    fn checksum_distinguishes_array_order() {
        let a = json!(["1", "2"]);
        let b = json!(["2", "1"]);
        assert_ne!(record_checksum(&a), record_checksum(&b));
    }

    #[test]
    fn checksum_is_sha256_hex() {
        let digest = record_checksum(&json!(null));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
