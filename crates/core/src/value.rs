//! Deep copy, merge and comparison for tree values
//!
//! A tree value is a plain `serde_json::Value`: scalars, arrays and
//! objects nested to any depth. Object keys keep their insertion order,
//! which shows up in merge output but never affects equality.
//!
//! Cyclic trees cannot be built out of owned `Value`s, so every function
//! here terminates.

use serde_json::{Map, Value};

/// Object map used by tree values
pub type Object = Map<String, Value>;

/// Mapping callback for [`map_obj`]: `(value, key, source object)`
pub type MapFn<'a> = &'a dyn Fn(&Value, &str, &Object) -> Value;

/// Check whether a value is falsy (`null`, `false`, `0`, `""`)
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Copy a tree so that the result shares no containers with the input
///
/// Same result as `deep_merge(value, None, false)`.
pub fn deep_copy(value: &Value) -> Value {
    value.clone()
}

/// Merge `source` into `destination` and return the result
///
/// - scalars replace whatever the destination held
/// - arrays replace the destination with copies of their elements, unless
///   `merge_arrays` is set and the destination is an array, in which case
///   the copies are appended
/// - objects merge key by key into the destination object, creating one
///   when the destination is absent or not an object
///
/// `merge_arrays` applies at every nesting level.
pub fn deep_merge(source: &Value, destination: Option<Value>, merge_arrays: bool) -> Value {
    let mut destination = destination.unwrap_or(Value::Null);
    deep_merge_into(source, &mut destination, merge_arrays);
    destination
}

/// In-place form of [`deep_merge`]
pub fn deep_merge_into(source: &Value, destination: &mut Value, merge_arrays: bool) {
    match source {
        Value::Array(items) if merge_arrays => {
            if let Value::Array(dst) = destination {
                dst.extend(items.iter().map(deep_copy));
                return;
            }
        }
        Value::Object(entries) => {
            if let Value::Object(dst) = destination {
                for (key, value) in entries {
                    match dst.get_mut(key) {
                        Some(slot) => deep_merge_into(value, slot, merge_arrays),
                        None => {
                            dst.insert(key.clone(), deep_copy(value));
                        }
                    }
                }
                return;
            }
        }
        _ => {}
    }

    *destination = deep_copy(source);
}

/// Structural equality with optional ignored object keys
///
/// If either side is falsy the comparison is strict: `0` and `""` are not
/// equal even though both are falsy. Numbers compare by numeric value, so
/// `1` equals `1.0`. Keys listed in `ignored_keys` are skipped in objects
/// at every depth.
pub fn deep_equal(a: &Value, b: &Value, ignored_keys: &[&str]) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    if is_falsy(a) || is_falsy(b) {
        return strict_equal(a, b);
    }

    match (a, b) {
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(l, r)| deep_equal(l, r, ignored_keys))
        }
        (Value::Object(left), Value::Object(right)) => {
            let ignored = |key: &str| ignored_keys.contains(&key);

            let left_matches = left
                .iter()
                .filter(|(key, _)| !ignored(key.as_str()))
                .all(|(key, value)| {
                    right
                        .get(key)
                        .map_or(false, |other| deep_equal(value, other, ignored_keys))
                });

            left_matches
                && right
                    .keys()
                    .filter(|key| !ignored(key.as_str()))
                    .all(|key| left.contains_key(key))
        }
        _ => strict_equal(a, b),
    }
}

/// Scalar equality; distinct containers are never strictly equal
fn strict_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(l), Some(r)) = (x.as_i64(), y.as_i64()) {
                return l == r;
            }
            if let (Some(l), Some(r)) = (x.as_u64(), y.as_u64()) {
                return l == r;
            }
            x.as_f64() == y.as_f64()
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => a == b,
    }
}

/// Check whether a value has no enumerable own keys
///
/// Absent and falsy values are empty. Non-empty strings are not, since
/// their characters are indexed.
pub fn is_empty_obj(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) if is_falsy(v) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(_)) => false,
        Some(_) => true,
    }
}

/// Build a new object from the entries of `obj`
///
/// Iterates `keys` when given (skipping keys `obj` lacks), otherwise all
/// keys of `obj` in order. Each output value is `f(value, key, obj)`, or a
/// copy of the value when `f` is `None`. Returns `None` when `obj` is
/// absent or not an object.
pub fn map_obj(obj: Option<&Value>, f: Option<MapFn<'_>>, keys: Option<&[&str]>) -> Option<Object> {
    let source = obj?.as_object()?;
    let convert = |key: &str, value: &Value| match f {
        Some(f) => f(value, key, source),
        None => value.clone(),
    };

    let mut result = Object::new();
    match keys {
        Some(keys) => {
            for &key in keys {
                if let Some(value) = source.get(key) {
                    result.insert(key.to_string(), convert(key, value));
                }
            }
        }
        None => {
            for (key, value) in source {
                result.insert(key.clone(), convert(key, value));
            }
        }
    }
    Some(result)
}
