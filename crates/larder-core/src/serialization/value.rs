//! Tagged value model.

use crate::errors::{LarderError, Result};
use crate::time::{to_canonical, Timestamp};
use indexmap::IndexMap;
use serde_json::Number;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A dynamically shaped value crossing a persistence boundary
///
/// Each variant is one branch of the serializer's dispatch: primitives,
/// points in time, arrays, plain objects, opaque instances, and the two
/// non-persistable leaves (`Undefined`, `Function`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; dropped from objects
    Undefined,
    /// JSON null
    Null,
    /// Boolean primitive
    Bool(bool),
    /// Numeric primitive
    Number(Number),
    /// String primitive
    String(String),
    /// Native point in time
    Timestamp(Timestamp),
    /// Ordered collection
    Array(Vec<Value>),
    /// Plain object with insertion-ordered keys
    Object(IndexMap<String, Value>),
    /// Callable leaf; never persisted
    Function(String),
    /// Instance of a type the serializer must not look inside
    Opaque(Opaque),
}

impl Value {
    /// Build an object from key/value pairs, keeping their order
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Borrow a field of an object
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Borrow the text of a string leaf
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the instant of a point-in-time leaf
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Convert into JSON
    ///
    /// Points in time become canonical text, undefined and function leaves
    /// are dropped from objects and become null inside arrays. Opaque
    /// instances have no JSON form and fail the conversion.
    pub fn into_json(self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Timestamp(ts) => serde_json::Value::String(to_canonical(&ts)),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(Value::into_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (key, value) in fields {
                    if matches!(value, Value::Undefined | Value::Function(_)) {
                        continue;
                    }
                    map.insert(key, value.into_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Opaque(opaque) => {
                return Err(LarderError::serialization(format!(
                    "Opaque {} value has no wire form",
                    opaque.type_name()
                )))
            }
        })
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Handle to a value the serializer passes through untouched
///
/// Equality is identity: two opaque values are equal only when they share
/// the same allocation.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap an instance
    pub fn new<T: Any + Send + Sync>(instance: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            handle: Arc::new(instance),
        }
    }

    /// Name of the wrapped type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the instance if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::from_epoch_millis;

    #[test]
    fn test_into_json_drops_non_persistable_fields() {
        let value = Value::object([
            ("a", Value::from(1_i64)),
            ("b", Value::Undefined),
            ("c", Value::Function("onPress".into())),
            (
                "d",
                Value::Array(vec![Value::Undefined, Value::from("x")]),
            ),
        ]);
        let json = value.into_json().unwrap();
        assert_eq!(json, serde_json::json!({ "a": 1, "d": [null, "x"] }));
    }

    #[test]
    fn test_into_json_renders_timestamps() {
        let ts = from_epoch_millis(1_714_555_800_125).unwrap();
        let json = Value::object([("at", Value::from(ts))]).into_json().unwrap();
        assert_eq!(json["at"], "2024-05-01T09:30:00.125Z");
    }

    #[test]
    fn test_opaque_has_no_wire_form() {
        let value = Value::Opaque(Opaque::new(42_u8));
        assert!(matches!(
            value.into_json(),
            Err(LarderError::Serialization { .. })
        ));
    }

    #[test]
    fn test_opaque_identity_equality() {
        let a = Opaque::new(String::from("handle"));
        let b = Opaque::new(String::from("handle"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("handle"));
    }

    #[test]
    fn test_json_key_order_preserved() {
        let json = serde_json::json!({ "z": 1, "a": 2, "m": 3 });
        let keys: Vec<_> = match Value::from(json) {
            Value::Object(fields) => fields.keys().cloned().collect(),
            other => panic!("expected object, got {other:?}"),
        };
        assert_eq!(keys, ["z", "a", "m"]);
    }
}
