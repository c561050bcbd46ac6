//! Stack-based tree rewriting shared by the serializer transforms.

use super::Value;
use indexmap::IndexMap;

/// Where a leaf sits inside its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position<'a> {
    /// The value being rewritten is itself a leaf
    Root,
    /// Element of an array, by index
    Element(usize),
    /// Field of an object, by key
    Field(&'a str),
}

enum Frame {
    Array {
        out: Vec<Value>,
        rest: std::vec::IntoIter<Value>,
    },
    Object {
        out: IndexMap<String, Value>,
        rest: indexmap::map::IntoIter<String, Value>,
        key: Option<String>,
    },
}

impl Frame {
    fn position(&self) -> Position<'_> {
        match self {
            Frame::Array { out, .. } => Position::Element(out.len()),
            Frame::Object { key, .. } => Position::Field(key.as_deref().unwrap_or_default()),
        }
    }

    fn next_child(&mut self) -> Option<Value> {
        match self {
            Frame::Array { rest, .. } => rest.next(),
            Frame::Object { rest, key, .. } => rest.next().map(|(k, v)| {
                *key = Some(k);
                v
            }),
        }
    }

    fn accept(&mut self, result: Option<Value>) {
        match self {
            Frame::Array { out, .. } => out.push(result.unwrap_or(Value::Null)),
            Frame::Object { out, key, .. } => {
                if let (Some(k), Some(v)) = (key.take(), result) {
                    out.insert(k, v);
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Frame::Array { out, .. } => Value::Array(out),
            Frame::Object { out, .. } => Value::Object(out),
        }
    }
}

/// Rebuild `root`, passing every non-container leaf through `leaf`
///
/// Returning `None` from `leaf` drops an object field; inside an array the
/// slot becomes null so indices stay stable. Array and object shape and key
/// order are preserved.
pub(crate) fn rewrite<F>(root: Value, mut leaf: F) -> Option<Value>
where
    F: FnMut(Value, Position<'_>) -> Option<Value>,
{
    let mut stack: Vec<Frame> = Vec::new();
    let mut pending = Some(root);

    loop {
        let mut finished = match pending.take() {
            Some(Value::Array(items)) => {
                stack.push(Frame::Array {
                    out: Vec::with_capacity(items.len()),
                    rest: items.into_iter(),
                });
                None
            }
            Some(Value::Object(fields)) => {
                stack.push(Frame::Object {
                    out: IndexMap::with_capacity(fields.len()),
                    rest: fields.into_iter(),
                    key: None,
                });
                None
            }
            Some(value) => {
                let position = stack.last().map_or(Position::Root, Frame::position);
                Some(leaf(value, position))
            }
            None => None,
        };

        loop {
            let Some(frame) = stack.last_mut() else {
                return finished.flatten();
            };
            if let Some(result) = finished.take() {
                frame.accept(result);
            }
            if let Some(child) = frame.next_child() {
                pending = Some(child);
                break;
            }
            if let Some(done) = stack.pop() {
                finished = Some(Some(done.finish()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_reported() {
        let value = Value::object([
            ("name", Value::from("a")),
            ("tags", Value::Array(vec![Value::from("x"), Value::from("y")])),
        ]);
        let mut seen = Vec::new();
        let rebuilt = rewrite(value.clone(), |leaf, position| {
            seen.push(match position {
                Position::Root => "root".to_string(),
                Position::Element(i) => format!("[{i}]"),
                Position::Field(k) => k.to_string(),
            });
            Some(leaf)
        });
        assert_eq!(rebuilt, Some(value));
        assert_eq!(seen, ["name", "[0]", "[1]"]);
    }

    #[test]
    fn test_empty_containers_survive() {
        let value = Value::object([
            ("empty_list", Value::Array(Vec::new())),
            ("empty_map", Value::Object(IndexMap::new())),
        ]);
        assert_eq!(rewrite(value.clone(), |leaf, _| Some(leaf)), Some(value));
    }

    #[test]
    fn test_dropped_root_leaf() {
        assert_eq!(rewrite(Value::Undefined, |_, _| None), None);
    }
}
