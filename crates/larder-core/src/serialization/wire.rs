//! Wire form: points in time as canonical text.

use super::walk::{rewrite, Position};
use super::Value;
use crate::time::{parse_canonical, to_canonical};

/// Replace every point-in-time leaf with its canonical text
pub fn to_wire(value: Value) -> Value {
    rewrite(value, |leaf, _| {
        Some(match leaf {
            Value::Timestamp(ts) => Value::String(to_canonical(&ts)),
            other => other,
        })
    })
    .unwrap_or(Value::Undefined)
}

/// Turn canonical text back into points in time
///
/// Only string fields whose key satisfies `is_timestamp_field` are parsed.
/// Text that does not parse becomes null: a broken timestamp must never
/// turn into a made-up date.
pub fn rehydrate<F>(value: Value, is_timestamp_field: F) -> Value
where
    F: Fn(&str) -> bool,
{
    rewrite(value, |leaf, position| {
        Some(match (leaf, position) {
            (Value::String(text), Position::Field(key)) if is_timestamp_field(key) => {
                match parse_canonical(&text) {
                    Ok(ts) => Value::Timestamp(ts),
                    Err(error) => {
                        tracing::warn!(field = key, %error, "Dropping unparseable timestamp");
                        Value::Null
                    }
                }
            }
            (other, _) => other,
        })
    })
    .unwrap_or(Value::Undefined)
}
