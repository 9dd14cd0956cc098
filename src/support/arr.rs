//! Dot-notation helpers over JSON values.
//!
//! Keys like `user.address.city` walk nested objects; numeric segments also
//! index into arrays. Objects and arrays are both treated as "arrays" in the
//! loose sense these helpers were designed around.

use serde_json::{Map, Value};

/// Check whether a value can hold keyed children.
pub fn accessible(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Check whether a top-level key exists (no dot walking).
pub fn exists(value: &Value, key: &str) -> bool {
    child(value, key).is_some()
}

/// Get a nested value by dot key. `None` key returns the value itself.
pub fn get<'a>(value: &'a Value, key: Option<&str>) -> Option<&'a Value> {
    let key = match key {
        Some(k) => k,
        None => return Some(value),
    };

    key.split('.')
        .try_fold(value, |current, segment| child(current, segment))
}

/// Get a nested value or a fallback.
pub fn get_or(value: &Value, key: &str, default: Value) -> Value {
    get(value, Some(key)).cloned().unwrap_or(default)
}

/// Check whether a dot key resolves.
pub fn has(value: &Value, key: &str) -> bool {
    get(value, Some(key)).is_some()
}

/// Set a nested value, creating (or replacing) intermediate objects.
/// Numeric segments index into arrays; one past the end appends.
pub fn set(target: &mut Value, key: &str, value: Value) {
    let mut current = target;
    for segment in key.split('.') {
        current = slot(current, segment);
    }
    *current = value;
}

/// Set a value only when the key is missing or null.
pub fn add(mut target: Value, key: &str, value: Value) -> Value {
    if get(&target, Some(key)).map(Value::is_null).unwrap_or(true) {
        set(&mut target, key, value);
    }
    target
}

/// Remove a nested key. Missing intermediate keys are a no-op; removing an
/// array element shifts the ones after it.
pub fn forget(target: &mut Value, key: &str) {
    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = target;
    for segment in parents {
        let next = match current {
            Value::Object(map) => map.get_mut(*segment),
            Value::Array(items) => index(segment).and_then(|i| items.get_mut(i)),
            _ => None,
        };
        current = match next {
            Some(next) => next,
            None => return,
        };
    }

    match current {
        Value::Object(map) => {
            map.shift_remove(*last);
        }
        Value::Array(items) => {
            if let Some(i) = index(last).filter(|i| *i < items.len()) {
                items.remove(i);
            }
        }
        _ => {}
    }
}

/// Keep only the given top-level keys, preserving the original order.
pub fn only(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Copy without the given dot keys.
pub fn except(value: &Value, keys: &[&str]) -> Value {
    let mut copy = value.clone();
    for key in keys {
        forget(&mut copy, key);
    }
    copy
}

/// First child value.
pub fn first(value: &Value) -> Option<&Value> {
    entries(value).into_iter().next().map(|(_, v)| v)
}

/// First child value passing `predicate(value, key)`.
pub fn first_where<F>(value: &Value, predicate: F) -> Option<&Value>
where
    F: Fn(&Value, &str) -> bool,
{
    entries(value)
        .into_iter()
        .find(|(k, v)| predicate(v, k))
        .map(|(_, v)| v)
}

/// Last child value.
pub fn last(value: &Value) -> Option<&Value> {
    entries(value).into_iter().next_back().map(|(_, v)| v)
}

/// Last child value passing `predicate(value, key)`.
pub fn last_where<F>(value: &Value, predicate: F) -> Option<&Value>
where
    F: Fn(&Value, &str) -> bool,
{
    entries(value)
        .into_iter()
        .rev()
        .find(|(k, v)| predicate(v, k))
        .map(|(_, v)| v)
}

/// Flatten nested containers into a list of leaves, up to `depth` levels.
pub fn flatten(value: &Value, depth: usize) -> Vec<Value> {
    let mut result = Vec::new();

    for (_, item) in entries(value) {
        if !accessible(item) {
            result.push(item.clone());
        } else if depth <= 1 {
            result.extend(entries(item).into_iter().map(|(_, v)| v.clone()));
        } else {
            result.extend(flatten(item, depth - 1));
        }
    }

    result
}

/// Flatten without a depth limit.
pub fn flatten_all(value: &Value) -> Vec<Value> {
    flatten(value, usize::MAX)
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        // Keep array elements under their index
        Value::Array(items) => {
            let map = std::mem::take(items)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect();
            *value = Value::Object(map);
        }
        Value::Object(_) => {}
        _ => *value = Value::Object(Map::new()),
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

fn index(segment: &str) -> Option<usize> {
    segment.parse().ok()
}

// Child slot for `segment`, created as null when missing.
fn slot<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    let position = match current {
        Value::Array(items) => index(segment).filter(|i| *i <= items.len()),
        _ => None,
    };

    match (current, position) {
        (Value::Array(items), Some(i)) => {
            if i == items.len() {
                items.push(Value::Null);
            }
            &mut items[i]
        }
        (current, _) => ensure_object(current)
            .entry(segment.to_string())
            .or_insert(Value::Null),
    }
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}
