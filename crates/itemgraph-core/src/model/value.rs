use itemgraph_core_types::ItemId;
use serde::{Deserialize, Serialize};

/// Primitive value held by a scalar property
///
/// An unset scalar ("undefined") is represented as `Option::<Value>::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// The value a property held before a change
///
/// Scalars and references change in place; child containers report the
/// child that was removed.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Option<Value>),
    Reference(Option<ItemId>),
    Child(Option<ItemId>),
}

impl PropertyValue {
    /// The scalar payload, if this is a scalar value
    pub fn scalar(&self) -> Option<&Value> {
        match self {
            PropertyValue::Scalar(v) => v.as_ref(),
            _ => None,
        }
    }

    /// The referenced or contained item id, if any
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            PropertyValue::Reference(id) | PropertyValue::Child(id) => *id,
            PropertyValue::Scalar(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shapes() {
        assert_eq!(serde_json::to_string(&Value::from(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Value::from("a")).unwrap(), "\"a\"");

        let int: Value = serde_json::from_str("12").unwrap();
        assert_eq!(int, Value::Int(12));
        let float: Value = serde_json::from_str("1.5").unwrap();
        assert_eq!(float, Value::Float(1.5));
        let flag: Value = serde_json::from_str("true").unwrap();
        assert_eq!(flag, Value::Bool(true));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(2).as_int(), Some(2));
        assert_eq!(Value::from(2).as_float(), Some(2.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_int(), None);
    }

    #[test]
    fn test_property_value_item_id() {
        let id = ItemId::new(5).unwrap();
        assert_eq!(PropertyValue::Child(Some(id)).item_id(), Some(id));
        assert_eq!(PropertyValue::Scalar(Some(Value::Int(5))).item_id(), None);
    }
}
