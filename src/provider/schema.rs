//! Attribute schema for provider resources.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    /// Map of string to string
    Map,
    /// Set of strings
    Set,
}

impl ValueType {
    /// True when `value` has this type; `null` matches every type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Int, Value::Number(n)) => n.is_i64(),
            (Self::Map, Value::Object(map)) => map.values().all(Value::is_string),
            (Self::Set, Value::Array(items)) => items.iter().all(Value::is_string),
            _ => false,
        }
    }
}

/// Schema of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub value_type: ValueType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Changing the value replaces the resource
    pub force_new: bool,
}

impl Schema {
    fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
        }
    }

    pub fn required(value_type: ValueType) -> Self {
        Self {
            required: true,
            ..Self::new(value_type)
        }
    }

    pub fn optional(value_type: ValueType) -> Self {
        Self {
            optional: true,
            ..Self::new(value_type)
        }
    }

    pub fn computed(value_type: ValueType) -> Self {
        Self {
            computed: true,
            ..Self::new(value_type)
        }
    }

    pub fn with_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Computed attributes the user may not set
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }
}

/// Attribute name to schema, ordered for stable output.
pub type SchemaMap = BTreeMap<String, Schema>;

/// Checks user-supplied attributes against a schema, returning one message per problem.
pub fn validate_config(schema: &SchemaMap, config: &BTreeMap<String, Value>) -> Vec<String> {
    let mut problems = Vec::new();

    for (name, attr) in schema {
        let value = config.get(name).filter(|v| !v.is_null());
        if attr.required && value.is_none() {
            problems.push(format!("missing required attribute \"{name}\""));
        }
        if let Some(value) = value {
            if attr.is_computed_only() {
                problems.push(format!("attribute \"{name}\" is computed and cannot be set"));
            } else if !attr.value_type.accepts(value) {
                problems.push(format!(
                    "attribute \"{name}\" must be of type {:?}",
                    attr.value_type
                ));
            }
        }
    }

    for name in config.keys() {
        if !schema.contains_key(name) {
            problems.push(format!("unsupported attribute \"{name}\""));
        }
    }

    problems
}
