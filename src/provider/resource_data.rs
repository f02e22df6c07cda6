//! Resource data: an id plus a loosely typed attribute map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute values of one resource instance, as held in state.
///
/// An empty id means the resource does not exist (or was found to be gone);
/// the host drops such instances from state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    /// Data for a resource that has not been created yet
    pub fn from_config(attributes: BTreeMap<String, Value>) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Marks the resource as gone so the host removes it from state
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// Like `get`, but zero values (empty string, 0, empty map or set) count as unset
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| match value {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_i64() != Some(0),
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
        })
    }

    pub fn get_str(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    /// String entries of a map attribute; non-string values are skipped
    pub fn get_string_map(&self, key: &str) -> HashMap<String, String> {
        match self.get_ok(key) {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            _ => HashMap::new(),
        }
    }

    /// Members of a set attribute, sorted and deduplicated
    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        match self.get_ok(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ResourceData {
        ResourceData::from_config(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn typed_getters_default_when_missing() {
        let d = data(json!({ "name": "Acme" }));
        assert_eq!(d.get_str("name"), "Acme");
        assert_eq!(d.get_str("realm_id"), "");
        assert_eq!(d.get_int("created_on"), 0);
        assert!(d.get_string_map("attrs").is_empty());
        assert!(d.get_string_set("apps").is_empty());
        assert!(d.is_gone());
    }

    #[test]
    fn get_ok_treats_zero_values_as_unset() {
        let d = data(json!({ "name": "", "created_on": 0, "attrs": {}, "apps": ["x"] }));
        assert!(d.get_ok("name").is_none());
        assert!(d.get_ok("created_on").is_none());
        assert!(d.get_ok("attrs").is_none());
        assert!(d.get_ok("apps").is_some());
    }

    #[test]
    fn set_semantics_sort_and_dedupe() {
        let d = data(json!({ "apps": ["portal", "billing", "portal"] }));
        assert_eq!(d.get_string_set("apps"), vec!["billing", "portal"]);
    }

    #[test]
    fn map_skips_non_string_values() {
        let d = data(json!({ "attrs": { "tier": "gold", "seats": 5 } }));
        let attrs = d.get_string_map("attrs");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["tier"], "gold");
    }

    #[test]
    fn clear_id_marks_gone() {
        let mut d = ResourceData::default();
        d.set_id("abc");
        assert!(!d.is_gone());
        d.clear_id();
        assert!(d.is_gone());
    }
}
