//! Safe traversal of loosely-typed JSON.
//!
//! Run documents come from an external harness and are never validated, so
//! every read goes through [`Field`], which makes absence explicit instead of
//! propagating nulls. JSON `null` is treated the same as a missing key.

use serde_json::{Map, Value};

/// Result of looking up a location inside a JSON document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Present(&'a Value),
    Absent,
}

impl<'a> Field<'a> {
    /// Wrap a root value.
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => Field::Absent,
            other => Field::Present(other),
        }
    }

    /// Step into an object key. Absent when this field is absent, is not an
    /// object, or lacks the key.
    pub fn get(self, key: &str) -> Field<'a> {
        match self {
            Field::Present(Value::Object(map)) => map.get(key).map_or(Field::Absent, Field::of),
            _ => Field::Absent,
        }
    }

    /// Step through a sequence of object keys.
    pub fn path(self, keys: &[&str]) -> Field<'a> {
        keys.iter().fold(self, |field, key| field.get(key))
    }

    pub fn value(self) -> Option<&'a Value> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn as_str(self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }

    pub fn as_bool(self) -> Option<bool> {
        self.value().and_then(Value::as_bool)
    }

    pub fn as_object(self) -> Option<&'a Map<String, Value>> {
        self.value().and_then(Value::as_object)
    }

    /// Array elements, or an empty slice for anything that is not an array.
    pub fn items(self) -> &'a [Value] {
        match self.value() {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    /// Numeric value, if this is a finite JSON number.
    pub fn as_number(self) -> Option<f64> {
        self.value()
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
    }

    /// Numeric value, with absent or non-numeric values read as 0.
    pub fn number_or_zero(self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Integral count, with absent or non-numeric values read as 0.
    /// Fractional numbers are truncated toward zero.
    pub fn count_or_zero(self) -> i64 {
        match self.value() {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Value to display, with a resolved-argument wrapper removed.
    ///
    /// A resolved argument is either a bare value or an object whose only
    /// keys are `value` and optionally `jsonpath`. Only the second shape is
    /// unwrapped, so ordinary objects that happen to have a `value` key are
    /// left alone.
    pub fn resolved_value(self) -> Field<'a> {
        match self.resolved_wrapper() {
            Some(map) => map.get("value").map_or(Field::Absent, Field::of),
            None => self,
        }
    }

    /// Provenance path of a resolved argument, when it carries one.
    pub fn resolved_jsonpath(self) -> Option<&'a str> {
        self.resolved_wrapper()
            .and_then(|map| map.get("jsonpath"))
            .and_then(Value::as_str)
    }

    fn resolved_wrapper(self) -> Option<&'a Map<String, Value>> {
        let map = self.as_object()?;
        let is_wrapper = map.contains_key("value")
            && map.keys().all(|k| k == "value" || k == "jsonpath");
        is_wrapper.then_some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_through_missing_levels_is_absent() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(Field::of(&doc).path(&["a", "b"]).number_or_zero(), 1.0);
        assert_eq!(Field::of(&doc).path(&["a", "x", "y"]), Field::Absent);
        assert_eq!(Field::of(&doc).path(&["a", "b", "c"]), Field::Absent);
    }

    #[test]
    fn null_is_absent() {
        let doc = json!({"a": null});
        assert!(!Field::of(&doc).get("a").is_present());
    }

    #[test]
    fn non_numeric_reads_as_zero() {
        let doc = json!({"s": "12", "b": true, "o": {}, "f": 2.9, "n": -3});
        let root = Field::of(&doc);
        assert_eq!(root.get("s").count_or_zero(), 0);
        assert_eq!(root.get("b").number_or_zero(), 0.0);
        assert_eq!(root.get("o").count_or_zero(), 0);
        assert_eq!(root.get("f").count_or_zero(), 2);
        assert_eq!(root.get("n").count_or_zero(), -3);
        assert_eq!(root.get("missing").number_or_zero(), 0.0);
    }

    #[test]
    fn resolved_value_unwraps_wrapper() {
        let arg = json!({"value": ["a", "b"], "jsonpath": "$.x"});
        let field = Field::of(&arg);
        assert_eq!(field.resolved_value().value(), Some(&json!(["a", "b"])));
        assert_eq!(field.resolved_jsonpath(), Some("$.x"));
    }

    #[test]
    fn resolved_value_passes_bare_values_through() {
        let bare = json!("Paris");
        assert_eq!(Field::of(&bare).resolved_value().as_str(), Some("Paris"));
        assert_eq!(Field::of(&bare).resolved_jsonpath(), None);

        let object = json!({"value": 1, "unit": "ms"});
        assert_eq!(Field::of(&object).resolved_value().value(), Some(&object));
    }

    #[test]
    fn items_of_non_array_is_empty() {
        let doc = json!({"xs": {"not": "array"}});
        assert!(Field::of(&doc).get("xs").items().is_empty());
    }
}
