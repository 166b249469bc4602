//! Path-addressed editing of `serde_json::Value` trees.
//!
//! These functions take the sub-path half of a parsed [`crate::Key`] and
//! apply it to one document. Numeric segments index into arrays; missing
//! intermediate segments are created as objects on write and read as absent
//! on lookup. Descending through a scalar is a [`Error::TargetType`] for
//! reads and writes; `unset_path` instead reports "unchanged", since an
//! unresolvable path has nothing to remove.

use serde_json::{Map, Value};

use crate::key::KeyPath;
use crate::Error;

/// Get a reference to the value at `path`, or `None` if any segment is
/// missing.
pub fn get_path<'a>(doc: &'a Value, path: &KeyPath) -> Result<Option<&'a Value>, Error> {
    let mut cursor = doc;
    for segment in path.iter() {
        cursor = match cursor {
            Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => return Ok(None),
            },
            Value::Array(arr) => match segment.parse::<usize>() {
                Ok(index) => match arr.get(index) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                Err(_) => return Ok(None),
            },
            Value::Null => return Ok(None),
            other => {
                return Err(Error::target_type(format!(
                    "cannot descend into {} at segment '{}'",
                    type_tag(other),
                    segment
                )))
            }
        };
    }
    Ok(Some(cursor))
}

/// Set `value` at `path`, creating intermediate objects for missing
/// segments. An empty path replaces the whole document.
pub fn set_path(doc: &mut Value, path: &KeyPath, value: Value) -> Result<(), Error> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }

    let last_index = path.len() - 1;
    let mut cursor = doc;

    for (i, segment) in path.iter().enumerate() {
        if i == last_index {
            return assign_child(cursor, segment, value);
        }

        cursor = match cursor {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(arr) => {
                let index = parse_index(segment, arr.len())?;
                if index == arr.len() {
                    arr.push(Value::Object(Map::new()));
                }
                &mut arr[index]
            }
            slot @ Value::Null => {
                *slot = Value::Object(Map::new());
                match slot {
                    Value::Object(map) => map
                        .entry(segment.to_string())
                        .or_insert_with(|| Value::Object(Map::new())),
                    _ => unreachable!(),
                }
            }
            other => {
                return Err(Error::target_type(format!(
                    "cannot descend into {} at segment '{}'",
                    type_tag(other),
                    segment
                )))
            }
        };
    }

    Ok(())
}

/// Assign `value` as the child named `segment` of `parent`.
fn assign_child(parent: &mut Value, segment: &str, value: Value) -> Result<(), Error> {
    match parent {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = parse_index(segment, arr.len())?;
            if index == arr.len() {
                arr.push(value);
            } else {
                arr[index] = value;
            }
            Ok(())
        }
        slot @ Value::Null => {
            let mut map = Map::new();
            map.insert(segment.to_string(), value);
            *slot = Value::Object(map);
            Ok(())
        }
        other => Err(Error::target_type(format!(
            "cannot set child '{}' on {}",
            segment,
            type_tag(other)
        ))),
    }
}

/// Parse an array index segment. Appending at `len` is allowed; anything
/// past that, or a non-numeric segment, is a target type error.
fn parse_index(segment: &str, len: usize) -> Result<usize, Error> {
    let index: usize = segment.parse().map_err(|_| {
        Error::target_type(format!("expected array index, got segment '{}'", segment))
    })?;
    if index > len {
        return Err(Error::target_type(format!(
            "array index {} out of bounds (len={})",
            index, len
        )));
    }
    Ok(index)
}

/// Remove the entry at `path`. Returns true iff the document changed; an
/// unresolvable path is a no-op, never an error.
pub fn unset_path(doc: &mut Value, path: &KeyPath) -> bool {
    let Some((parent_path, last)) = path.split_last() else {
        return false;
    };

    let Ok(Some(parent)) = get_path_mut(doc, &parent_path) else {
        return false;
    };

    match parent {
        Value::Object(map) => map.remove(last).is_some(),
        Value::Array(arr) => match last.parse::<usize>() {
            Ok(index) if index < arr.len() => {
                arr.remove(index);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Check whether `path` resolves to a value. Scalar descent counts as
/// unresolved.
pub fn contains_path(doc: &Value, path: &KeyPath) -> bool {
    matches!(get_path(doc, path), Ok(Some(_)))
}

fn get_path_mut<'a>(doc: &'a mut Value, path: &KeyPath) -> Result<Option<&'a mut Value>, Error> {
    let mut cursor = doc;
    for segment in path.iter() {
        cursor = match cursor {
            Value::Object(map) => match map.get_mut(segment) {
                Some(next) => next,
                None => return Ok(None),
            },
            Value::Array(arr) => match segment.parse::<usize>() {
                Ok(index) => match arr.get_mut(index) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                Err(_) => return Ok(None),
            },
            _ => return Ok(None),
        };
    }
    Ok(Some(cursor))
}

/// The dynamic type tag of a value, with arrays tagged distinctly from
/// objects.
pub fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
