//! Deterministic JSON for exchanged artifacts.
//!
//! Two authors that produce the same edit batch should produce the same bytes,
//! so batches can be diffed, cached and compared across tools:
//! - object keys are sorted lexicographically, recursively
//! - arrays keep their order (edit order is meaningful)
//! - output is minified
//!
//! Wire types carry no floats, so no number normalization is defined.

use serde::Serialize;
use serde_json::{Map, Value};

pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let sorted = sort_keys(serde_json::to_value(value)?);
    serde_json::to_vec(&sorted)
}

pub fn to_canonical_json_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let sorted = sort_keys(serde_json::to_value(value)?);
    serde_json::to_string(&sorted)
}

fn sort_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
