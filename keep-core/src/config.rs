//! # Configuration
//!
//! keep uses a flat string key/value store. Applications layer it
//! however they like: defaults in code, then environment overrides.
//!
//! ## Setting and reading values
//! ```rust
//! use keep_core::KeepConfig;
//! let mut config = KeepConfig::new();
//!
//! config.set("paginate.owner_documents", "100");
//! config.set("blob.bucket", "documents-eu");
//!
//! assert_eq!(config.get("blob.bucket"), Some("documents-eu"));
//! assert_eq!(config.snapshot().get_usize("paginate.owner_documents"), Some(100));
//! ```
//!
//! ## Environment overrides
//! Variables under a prefix are lower-cased and `__` becomes `.`:
//!
//! ```bash
//! export KEEP__BLOB__BUCKET=documents-eu   # → blob.bucket
//! export KEEP__MONGO__URI=mongodb://db:27017
//! ```

use std::collections::HashMap;

use crate::errors::{KeepError, KeepResult};

#[derive(Debug, Default)]
pub struct KeepConfig {
    values: HashMap<String, String>,
}

impl KeepConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load every `{prefix}SECTION__KEY` environment variable.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Same as [`KeepConfig::from_env`] over an explicit variable list.
    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::new();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                config.set(normalized, value);
            }
        }
        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a value only when the key is not present yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> KeepConfigSnapshot {
        KeepConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeepConfigSnapshot {
    map: HashMap<String, String>,
}

impl KeepConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }

    /// A key the application cannot start without.
    pub fn require(&self, key: &str) -> KeepResult<String> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => Err(KeepError::invalid_argument(format!(
                "missing required configuration key: {key}"
            ))),
        }
    }
}
