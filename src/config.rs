//! Speller configuration.
//!
//! `SpellerConfig` sizes the worker pool; `DictionaryPaths` is the named-pair
//! form of the affix/dictionary input.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArgumentError;

/// Environment variable overriding the number of workers.
pub const WORKERS_ENV: &str = "SPELLGUARD_WORKERS";

/// Environment variable overriding the queue capacity.
pub const QUEUE_CAPACITY_ENV: &str = "SPELLGUARD_QUEUE_CAPACITY";

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellerConfig {
    /// Number of worker threads running deferred operations.
    pub workers: usize,
    /// Maximum queued deferred operations.
    pub queue_capacity: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for SpellerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            thread_name: "spellguard".to_string(),
        }
    }
}

impl SpellerConfig {
    /// Defaults overridden by `SPELLGUARD_WORKERS` and
    /// `SPELLGUARD_QUEUE_CAPACITY` when they hold positive integers.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(workers) = positive_env(WORKERS_ENV) {
            config.workers = workers;
        }
        if let Some(capacity) = positive_env(QUEUE_CAPACITY_ENV) {
            config.queue_capacity = capacity;
        }
        config
    }
}

fn positive_env(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid environment override");
            None
        }
    }
}

/// Affix and dictionary file pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DictionaryPaths {
    /// Path to the affix (`.aff`) file.
    pub aff: PathBuf,
    /// Path to the dictionary (`.dic`) file.
    pub dic: PathBuf,
}

impl DictionaryPaths {
    /// Creates a pair from two paths.
    pub fn new(aff: impl AsRef<Path>, dic: impl AsRef<Path>) -> Self {
        Self {
            aff: aff.as_ref().to_path_buf(),
            dic: dic.as_ref().to_path_buf(),
        }
    }

    /// Parses `{ "aff": "...", "dic": "..." }`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads loosely typed constructor arguments: either one object with
    /// string `aff` and `dic` members, or two strings.
    pub fn from_args(args: &[Value]) -> Result<Self, ArgumentError> {
        match args {
            [Value::Object(map)] => match (map.get("aff"), map.get("dic")) {
                (Some(Value::String(aff)), Some(Value::String(dic))) => Ok(Self::new(aff, dic)),
                _ => Err(ArgumentError::First),
            },
            [aff, dic] => {
                let Value::String(aff) = aff else {
                    return Err(ArgumentError::First);
                };
                let Value::String(dic) = dic else {
                    return Err(ArgumentError::Second);
                };
                Ok(Self::new(aff, dic))
            }
            _ => Err(ArgumentError::Count),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config = SpellerConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 1024);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SpellerConfig = serde_json::from_str(r#"{ "workers": 2 }"#).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.thread_name, "spellguard");
    }

    #[test]
    fn dictionary_paths_from_json() {
        let paths = DictionaryPaths::from_json(r#"{ "aff": "en_US.aff", "dic": "en_US.dic" }"#).unwrap();
        assert_eq!(paths, DictionaryPaths::new("en_US.aff", "en_US.dic"));
        assert!(DictionaryPaths::from_json(r#"{ "aff": "en_US.aff" }"#).is_err());
    }

    #[test]
    fn dictionary_paths_from_args() {
        let expected = DictionaryPaths::new("a.aff", "a.dic");
        assert_eq!(
            DictionaryPaths::from_args(&[json!({ "aff": "a.aff", "dic": "a.dic" })]),
            Ok(expected.clone())
        );
        assert_eq!(DictionaryPaths::from_args(&[json!("a.aff"), json!("a.dic")]), Ok(expected));

        assert_eq!(DictionaryPaths::from_args(&[]), Err(ArgumentError::Count));
        assert_eq!(DictionaryPaths::from_args(&[json!("a.aff")]), Err(ArgumentError::Count));
        assert_eq!(
            DictionaryPaths::from_args(&[json!({ "aff": "a.aff" })]),
            Err(ArgumentError::First)
        );
        assert_eq!(
            DictionaryPaths::from_args(&[json!({ "aff": 1, "dic": "a.dic" })]),
            Err(ArgumentError::First)
        );
        assert_eq!(DictionaryPaths::from_args(&[json!(1), json!("a.dic")]), Err(ArgumentError::First));
        assert_eq!(DictionaryPaths::from_args(&[json!("a.aff"), json!(null)]), Err(ArgumentError::Second));
    }
}
