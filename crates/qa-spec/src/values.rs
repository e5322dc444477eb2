use std::collections::BTreeMap;

use serde_json::Value;

/// Flat name -> answer store shared by every step of a session.
pub type FormValues = BTreeMap<String, Value>;

/// Field name -> first failing message.
pub type ErrorMap = BTreeMap<String, String>;

/// Absent-like values: null, blank strings and empty arrays.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Reads a JSON object into [`FormValues`]; anything else yields an empty map.
pub fn values_from_json(value: &Value) -> FormValues {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

pub fn values_to_json(values: &FormValues) -> Value {
    serde_json::to_value(values).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_covers_null_whitespace_and_empty_arrays() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!("   "))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(false))));
        assert!(!is_blank(Some(&json!(0))));
    }

    #[test]
    fn non_object_json_reads_as_empty_values() {
        assert!(values_from_json(&json!([1, 2])).is_empty());
        let values = values_from_json(&json!({ "name": "Ada" }));
        assert_eq!(values_to_json(&values), json!({ "name": "Ada" }));
    }
}
