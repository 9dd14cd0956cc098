//! File-backed configuration repository.
//!
//! Every `*.json` file in the config directory becomes a top-level key named
//! after the file stem, so `config/logging.json` is read with
//! `repo.get("logging.channel")`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::ConfigError;
use crate::support::arr;

/// Loaded configuration files.
#[derive(Clone, Debug, Default)]
pub struct Repository {
    items: Value,
}

impl Repository {
    /// Build from an in-memory value.
    pub fn new(items: Value) -> Self {
        Self { items }
    }

    /// Load all `*.json` files from `dir`. A missing directory yields an
    /// empty repository.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut items = Map::new();

        if !dir.is_dir() {
            return Ok(Self::new(Value::Object(items)));
        }

        let io_err = |error| ConfigError::Io {
            path: dir.display().to_string(),
            error,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let contents = std::fs::read_to_string(&path).map_err(|error| ConfigError::Io {
                path: path.display().to_string(),
                error,
            })?;
            let value: Value =
                serde_json::from_str(&contents).map_err(|error| ConfigError::Json {
                    path: path.display().to_string(),
                    error,
                })?;
            items.insert(stem.to_string(), value);
        }

        Ok(Self::new(Value::Object(items)))
    }

    /// Get a value by dot key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        arr::get(&self.items, Some(key))
    }

    /// Get a value by dot key, falling back to `default`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        arr::get_or(&self.items, key, default)
    }

    pub fn has(&self, key: &str) -> bool {
        arr::has(&self.items, key)
    }

    /// Override a value at runtime.
    pub fn set(&mut self, key: &str, value: Value) {
        arr::set(&mut self.items, key, value);
    }

    /// Deserialize a section into a typed struct. Missing sections
    /// deserialize from an empty object so `#[serde(default)]` applies.
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
            key: key.into(),
            message: e.to_string(),
        })
    }

    /// Everything, keyed by file stem.
    pub fn all(&self) -> &Value {
        &self.items
    }
}
