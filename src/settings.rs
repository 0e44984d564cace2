//! # Settings store read by the dispatch loop and providers.
//!
//! [`Settings`] is a small thread-safe key/value store. Keys are case-insensitive
//! dotted names. The dispatch loop reads exactly one key,
//! [`DISABLE_FLUSH_ON_EXIT`], when it shuts down; providers read their own
//! settings under `logging.provider.<name>.<key>` (see [`Settings::provider`]).
//!
//! Values can be changed at any time from any thread; every read observes the
//! latest write.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Key of the "skip the final flush at shutdown" flag.
pub const DISABLE_FLUSH_ON_EXIT: &str = "logging.disable_flush_on_exit";

/// Prefix of provider-scoped keys.
pub const PROVIDER_PREFIX: &str = "logging.provider";

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}

/// Thread-safe settings store.
#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl Settings {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled from a map (e.g. the `settings` section of a config file).
    pub fn from_map(map: HashMap<String, SettingValue>) -> Self {
        let values = map.into_iter().map(|(k, v)| (normalize(&k), v)).collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Sets (or replaces) a value.
    pub fn set(&self, key: &str, value: impl Into<SettingValue>) {
        self.values.write().insert(normalize(key), value.into());
    }

    /// Removes a value; returns the previous one.
    pub fn remove(&self, key: &str) -> Option<SettingValue> {
        self.values.write().remove(&normalize(key))
    }

    /// Returns a copy of the value.
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(&normalize(key)).cloned()
    }

    /// Reads a boolean; text `"true"`/`"false"` and integers `0`/non-zero are accepted.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            SettingValue::Bool(b) => Some(b),
            SettingValue::Int(i) => Some(i != 0),
            SettingValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Reads an integer; numeric text is accepted.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            SettingValue::Int(i) => Some(i),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    /// Reads a value rendered as text.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            SettingValue::Text(s) => Some(s),
            SettingValue::Bool(b) => Some(b.to_string()),
            SettingValue::Int(i) => Some(i.to_string()),
        }
    }

    /// True if the final flush at shutdown is disabled. Absent means enabled.
    pub fn flush_disabled(&self) -> bool {
        self.get_bool(DISABLE_FLUSH_ON_EXIT).unwrap_or(false)
    }

    /// Reads a provider-scoped value: `logging.provider.<provider>.<key>`.
    pub fn provider(&self, provider: &str, key: &str) -> Option<SettingValue> {
        self.get(&provider_key(provider, key))
    }

    /// Sets a provider-scoped value.
    pub fn set_provider(&self, provider: &str, key: &str, value: impl Into<SettingValue>) {
        self.set(&provider_key(provider, key), value);
    }
}

/// Builds the full key of a provider-scoped setting.
pub fn provider_key(provider: &str, key: &str) -> String {
    format!("{PROVIDER_PREFIX}.{provider}.{key}")
}

fn normalize(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}
