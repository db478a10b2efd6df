//! Tolerant reading helpers for clinician-authored documents.
//!
//! Protocol documents come from many historical editors. A container with the
//! wrong JSON type collapses to empty and a list entry that cannot be read is
//! skipped, each with a warning, instead of failing the whole document.
//!
//! Fields that go by several names are read from the raw object with the
//! `*_field` helpers, which take the first name present in a fixed order, so
//! an object carrying two spellings of one field still reads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Deserialize a list, skipping unreadable entries.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(list_from_value(value))
}

/// Deserialize a string-or-list field into a list of strings.
pub(crate) fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_list_from_value(&value))
}

/// The value under the first of `keys` that is present and not `null`.
pub(crate) fn field<'m>(map: &'m Map<String, Value>, keys: &[&str]) -> Option<&'m Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// The first readable text under `keys`, in order.
pub(crate) fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(text_from_value))
}

/// A string-or-list field under the first present of `keys`.
pub(crate) fn text_list_field(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    field(map, keys)
        .map(text_list_from_value)
        .unwrap_or_default()
}

/// A list under the first present of `keys`, skipping unreadable entries.
pub(crate) fn list_field<T: DeserializeOwned>(map: &Map<String, Value>, keys: &[&str]) -> Vec<T> {
    field(map, keys)
        .map(|value| list_from_value(value.clone()))
        .unwrap_or_default()
}

/// A nested object under the first present of `keys`, absent when unreadable.
pub(crate) fn option_field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    keys: &[&str],
) -> Option<T> {
    field(map, keys).and_then(|value| option_from_value(value.clone()))
}

pub(crate) fn option_from_value<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(
                target_type = std::any::type_name::<T>(),
                error = %e,
                "ignoring unreadable protocol section"
            );
            None
        }
    }
}

pub(crate) fn list_from_value<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(
                        target_type = std::any::type_name::<T>(),
                        index,
                        error = %e,
                        "skipping unreadable list entry"
                    );
                    None
                }
            })
            .collect(),
        other => {
            tracing::warn!(
                target_type = std::any::type_name::<T>(),
                found = json_type(&other),
                "expected a list; treating as empty"
            );
            Vec::new()
        }
    }
}

fn text_list_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(text_from_value).collect(),
        other => text_from_value(other).into_iter().collect(),
    }
}

pub(crate) fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_skips_bad_entries() {
        let parsed: Vec<u32> = list_from_value(json!([1, "two", 3]));
        assert_eq!(parsed, vec![1, 3]);
    }

    #[test]
    fn list_of_wrong_type_is_empty() {
        let parsed: Vec<u32> = list_from_value(json!({"not": "a list"}));
        assert!(parsed.is_empty());
        let parsed: Vec<u32> = list_from_value(Value::Null);
        assert!(parsed.is_empty());
    }

    #[test]
    fn first_present_key_wins() {
        let map = json!({ "name": "", "item": "Zinc", "frequency": "daily", "timing": "evening" });
        let map = map.as_object().unwrap();
        assert_eq!(text_field(map, &["timing", "frequency"]), Some("evening".to_owned()));
        assert_eq!(text_field(map, &["frequency", "timing"]), Some("daily".to_owned()));
        // A blank preferred spelling falls through to the next one.
        assert_eq!(text_field(map, &["name", "item"]), Some("Zinc".to_owned()));
        assert_eq!(text_field(map, &["dose"]), None);
    }

    #[test]
    fn null_field_falls_through() {
        let map = json!({ "expansion_phases": null, "phases": [1, 2] });
        let map = map.as_object().unwrap();
        let parsed: Vec<u32> = list_field(map, &["expansion_phases", "phases"]);
        assert_eq!(parsed, vec![1, 2]);
        assert_eq!(text_list_field(map, &["missing"]), Vec::<String>::new());
    }

    #[test]
    fn text_accepts_scalars_only() {
        assert_eq!(text_from_value(&json!("  400mg ")), Some("400mg".to_owned()));
        assert_eq!(text_from_value(&json!(2)), Some("2".to_owned()));
        assert_eq!(text_from_value(&json!("   ")), None);
        assert_eq!(text_from_value(&json!(["a"])), None);
    }
}
