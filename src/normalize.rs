//! Key normalization for JSON records.

use serde_json::{Map, Value};

/// Lowercases the top-level keys of a JSON object and drops null members.
///
/// Anything other than an object is returned unchanged. When two keys differ
/// only in case, the one that comes last in the object wins.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut normalized = Map::with_capacity(members.len());
            for (key, value) in members {
                if value.is_null() {
                    continue;
                }
                normalized.insert(key.to_lowercase(), value);
            }
            Value::Object(normalized)
        }
        other => other,
    }
}
