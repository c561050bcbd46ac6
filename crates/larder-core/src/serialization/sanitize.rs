//! String sanitization.

use super::walk::{rewrite, Position};
use super::Value;

/// Remove control characters and angle brackets, then trim whitespace
pub fn sanitize_str(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect();
    stripped.trim().to_string()
}

/// Sanitize every string leaf of a value
///
/// Points in time and opaque instances pass through untouched. Undefined
/// and function leaves are dropped from objects and become null inside
/// arrays; at the root they are returned as-is.
pub fn sanitize(value: Value) -> Value {
    rewrite(value, |leaf, position| match leaf {
        Value::String(text) => Some(Value::String(sanitize_str(&text))),
        Value::Undefined | Value::Function(_) => match position {
            Position::Field(_) => None,
            Position::Element(_) => Some(Value::Null),
            Position::Root => Some(leaf),
        },
        other => Some(other),
    })
    .unwrap_or(Value::Undefined)
}
