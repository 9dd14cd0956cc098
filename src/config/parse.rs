//! Environment variable parsing utilities.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use super::ConfigError;

static JSON_LIKE: OnceLock<Regex> = OnceLock::new();

/// Get environment variable with default value.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable (None if empty or missing).
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Parse environment variable as boolean.
/// Treats "1", "true" (case-insensitive) as true.
pub fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(default)
}

/// Parse environment variable with type conversion.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.into(),
            value: v,
            error: e.to_string(),
        }),
        _ => Ok(default),
    }
}

/// Read an environment variable and coerce it to a JSON value.
///
/// `true`/`false`/`null` become their literals, `empty` an empty string,
/// numerics a number (float when they contain a dot), bracketed text is
/// tried as JSON. Anything else is the trimmed string. Missing keys yield
/// `default`.
pub fn env_value(key: &str, default: Value) -> Value {
    match std::env::var(key) {
        Ok(raw) => coerce_env_value(&raw),
        Err(_) => default,
    }
}

/// Coercion rules behind [`env_value`].
pub fn coerce_env_value(raw: &str) -> Value {
    let trimmed = raw.trim();

    match trimmed.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        "empty" => return Value::String(String::new()),
        _ => {}
    }

    if let Some(number) = parse_numeric(trimmed) {
        return number;
    }

    let json_like = JSON_LIKE
        .get_or_init(|| Regex::new(r"^[\[{].*[\]}]$").expect("Invalid regex"));
    if json_like.is_match(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if !value.is_null() {
                return value;
            }
        }
    }

    Value::String(trimmed.to_string())
}

fn parse_numeric(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }
    if s.contains('.') {
        let f: f64 = s.parse().ok()?;
        return serde_json::Number::from_f64(f).map(Value::Number);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    // Exponent forms like "1e3" are numeric but not integers
    let f: f64 = s.parse().ok().filter(|f: &f64| f.is_finite())?;
    serde_json::Number::from_f64(f).map(Value::Number)
}

/// Parse duration string (e.g., "30s", "2m", "1h", "1d", "1w").
/// Returns None for "off" or "0".
pub fn parse_duration(s: &str) -> Result<Option<Duration>, String> {
    let s = s.trim().to_lowercase();

    if s == "off" || s == "0" || s.is_empty() {
        return Ok(None);
    }

    let unit = match s.chars().last() {
        Some(c @ ('s' | 'm' | 'h' | 'd' | 'w')) => c,
        _ => {
            // Plain seconds
            return s
                .parse::<u64>()
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|_| format!("invalid duration: {}", s));
        }
    };

    let num_str = &s[..s.len() - 1];
    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let secs = match unit {
        's' => num,
        'm' => num * 60,
        'h' => num * 3600,
        'd' => num * 86400,
        _ => num * 86400 * 7,
    };

    Ok(Some(Duration::from_secs(secs)))
}

/// Parse environment variable as duration.
pub fn env_duration(key: &str, default: &str) -> Result<Option<Duration>, ConfigError> {
    let value = env_or(key, default);
    parse_duration(&value).map_err(|e| ConfigError::Parse {
        key: key.into(),
        value,
        error: e,
    })
}
