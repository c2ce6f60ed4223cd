//! Canonical JSON output.
//!
//! Manifests and locale files are written with recursively sorted keys and
//! two-space indentation so package contents are stable and diffable.

use crate::bundler::error::Result;
use serde_json::{Map, Value};

/// Returns a copy of `value` with every object's keys in sorted order.
pub fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Serializes `value` with sorted keys and two-space indentation.
pub fn to_pretty_sorted(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sorted(value))?)
}

/// Serialization used for locale files: sorted, indented, newline terminated.
pub fn to_canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut text = to_pretty_sorted(value)?;
    text.push('\n');
    Ok(text.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_are_sorted() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
        let text = to_pretty_sorted(&value).unwrap();

        let a = text.find("\"a\"").unwrap();
        let b = text.find("\"b\"").unwrap();
        assert!(a < b);
        assert!(text.find("\"x\"").unwrap() < text.find("\"y\"").unwrap());
    }

    #[test]
    fn canonical_bytes_keep_non_ascii_and_end_with_newline() {
        let value = json!({"name": {"message": "Bloqueur de publicités…"}});
        let bytes = to_canonical_bytes(&value).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.ends_with("}\n"));
        assert!(text.contains("publicités…"));
        assert!(text.contains("\"name\": {\n    \"message\""));
    }
}
