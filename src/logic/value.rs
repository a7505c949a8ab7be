use crate::model::{AttrValue, Record};
use chrono::SecondsFormat;
use std::collections::BTreeMap;

/// Converts a raw store value into a JSON-safe value: temporal values become
/// ISO-8601 strings, opaque identifiers their string form, collections
/// convert recursively. Never fails: a value with no native JSON form falls
/// back to its string representation.
pub fn json_safe(value: &AttrValue) -> serde_json::Value {
    match value {
        AttrValue::Null => serde_json::Value::Null,
        AttrValue::Bool(b) => serde_json::Value::Bool(*b),
        AttrValue::Int(i) => serde_json::Value::Number((*i).into()),
        AttrValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            // non-finite floats have no JSON form
            .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
        AttrValue::Str(s) => serde_json::Value::String(s.clone()),
        AttrValue::Time(t) => {
            serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        AttrValue::ObjectId(u) => serde_json::Value::String(u.to_string()),
        AttrValue::Array(items) => serde_json::Value::Array(items.iter().map(json_safe).collect()),
        AttrValue::Map(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), json_safe(v))).collect(),
        ),
    }
}

/// True when a field is stripped from serialized instance attributes. An
/// exclusion entry beginning with `_` matches as a name suffix (the internal
/// id convention), anything else matches exactly.
pub fn is_excluded_attribute(field: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|entry| {
        if entry.starts_with('_') {
            field.ends_with(entry.as_str())
        } else {
            field == entry
        }
    })
}

/// Serializes a record's attributes with exclusions applied.
pub fn serialize_attributes(
    record: &Record,
    excluded: &[String],
) -> BTreeMap<String, serde_json::Value> {
    record
        .attributes
        .iter()
        .filter(|(name, _)| !is_excluded_attribute(name, excluded))
        .map(|(name, value)| (name.clone(), json_safe(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn temporal_and_opaque_values_become_strings() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            json_safe(&AttrValue::Time(time)),
            serde_json::json!("2024-03-01T12:30:00Z")
        );

        let oid = Uuid::from_u128(7);
        assert_eq!(
            json_safe(&AttrValue::ObjectId(oid)),
            serde_json::json!(oid.to_string())
        );
    }

    #[test]
    fn collections_normalize_recursively() {
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let value = AttrValue::Array(vec![
            AttrValue::Int(1),
            AttrValue::Map(BTreeMap::from([(
                "at".to_string(),
                AttrValue::Time(time),
            )])),
        ]);
        assert_eq!(
            json_safe(&value),
            serde_json::json!([1, { "at": "2020-01-01T00:00:00Z" }])
        );
    }

    #[test]
    fn non_finite_floats_fall_back_to_strings() {
        assert_eq!(json_safe(&AttrValue::Float(2.5)), serde_json::json!(2.5));
        assert_eq!(
            json_safe(&AttrValue::Float(f64::NAN)),
            serde_json::json!("NaN")
        );
    }

    #[test]
    fn exclusion_entries_match_suffix_or_exact() {
        let excluded = vec!["_id".to_string(), "created_at".to_string()];
        assert!(is_excluded_attribute("_id", &excluded));
        assert!(is_excluded_attribute("author_id", &excluded));
        assert!(is_excluded_attribute("created_at", &excluded));
        assert!(!is_excluded_attribute("id", &excluded));
        assert!(!is_excluded_attribute("created_at_label", &excluded));
    }
}
