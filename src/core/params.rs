//! Query string, form body and cookie parsing.
//!
//! Form-style keys follow the bracket convention: `tags[]=a&tags[]=b` builds a
//! list and `user[name]=x` builds a nested map.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Request parameters keyed by name.
pub type Params = Map<String, Value>;

/// Decode a form component: `+` is a space, then percent-decoding.
#[inline]
pub fn decode_component(s: &str) -> String {
    if !s.contains('%') && !s.contains('+') {
        return s.to_string();
    }
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parse a url-encoded string (query string or form body).
pub fn parse_urlencoded(input: &str) -> Params {
    let mut params = Params::new();

    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };

        let key = decode_component(key);
        if key.is_empty() {
            continue;
        }

        insert_param(&mut params, &key, Value::String(decode_component(value)));
    }

    params
}

/// Parse a Cookie header into name-value pairs.
pub fn parse_cookies(cookie_header: &str) -> Params {
    let mut cookies = Params::new();

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if cookie.is_empty() {
            continue;
        }

        let (name, value) = match cookie.find('=') {
            Some(pos) => (cookie[..pos].trim(), cookie[pos + 1..].trim()),
            None => continue,
        };

        if !name.is_empty() {
            let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
            cookies.insert(name.to_string(), Value::String(value));
        }
    }

    cookies
}

/// Deepest bracket nesting accepted in a parameter key.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Insert a value under a possibly bracketed key (`a`, `a[]`, `a[b][c]`).
/// Keys nested deeper than [`MAX_NESTING_DEPTH`] are dropped.
pub fn insert_param(params: &mut Params, key: &str, value: Value) {
    let (base, segments) = split_key(key);

    if segments.len() > MAX_NESTING_DEPTH {
        tracing::debug!(
            depth = segments.len(),
            "Dropping parameter nested deeper than {}",
            MAX_NESTING_DEPTH
        );
        return;
    }

    if segments.is_empty() {
        params.insert(base.to_string(), value);
        return;
    }

    let slot = params.entry(base.to_string()).or_insert(Value::Null);
    insert_nested(slot, &segments, value);
}

/// Split `a[b][]` into (`a`, [`b`, ``]). Malformed brackets keep the raw key.
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let open = match key.find('[') {
        Some(pos) if pos > 0 => pos,
        _ => return (key, Vec::new()),
    };

    let base = &key[..open];
    let mut segments = Vec::new();
    let mut rest = &key[open..];

    while let Some(stripped) = rest.strip_prefix('[') {
        // One past the limit is enough for the caller to reject the key
        if segments.len() > MAX_NESTING_DEPTH {
            break;
        }
        match stripped.find(']') {
            Some(close) => {
                segments.push(&stripped[..close]);
                rest = &stripped[close + 1..];
            }
            None => return (key, Vec::new()),
        }
    }

    (base, segments)
}

fn insert_nested(slot: &mut Value, segments: &[&str], value: Value) {
    let (head, tail) = match segments.split_first() {
        Some(split) => split,
        None => {
            *slot = value;
            return;
        }
    };

    if head.is_empty() {
        // Append
        match slot {
            Value::Array(items) => {
                items.push(Value::Null);
                if let Some(last) = items.last_mut() {
                    insert_nested(last, tail, value);
                }
            }
            Value::Object(map) => {
                let next = next_index(map).to_string();
                let entry = map.entry(next).or_insert(Value::Null);
                insert_nested(entry, tail, value);
            }
            _ => {
                let mut child = Value::Null;
                insert_nested(&mut child, tail, value);
                *slot = Value::Array(vec![child]);
            }
        }
        return;
    }

    if let Value::Array(items) = slot {
        let map: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *slot = Value::Object(map);
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }

    if let Value::Object(map) = slot {
        let entry = map.entry(head.to_string()).or_insert(Value::Null);
        insert_nested(entry, tail, value);
    }
}

fn next_index(map: &Map<String, Value>) -> u64 {
    map.keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(0)
}
