// SPDX-License-Identifier: MIT

//! Evaluator limits, loadable from YAML/JSON with environment overrides

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Maximum expression length in characters
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 1000;

/// Limits applied by the parser and the tree evaluator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Expressions longer than this are rejected before parsing
    pub max_expression_length: usize,
    /// Maximum nesting depth accepted by the parser
    pub max_depth: usize,
    /// Number of validated ASTs kept in memory; 0 disables the cache
    pub cache_capacity: usize,
    pub regex: RegexConfig,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
            max_depth: 64,
            cache_capacity: 1024,
            regex: RegexConfig::default(),
        }
    }
}

/// Limits applied by the safe regex service
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegexConfig {
    pub max_pattern_length: usize,
    pub max_input_length: usize,
    pub timeout_ms: u64,
    /// Upper bound on the compiled program size, in bytes
    pub max_compiled_size: usize,
    /// Number of compiled patterns kept in memory
    pub cache_capacity: usize,
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self {
            max_pattern_length: 256,
            max_input_length: 10_000,
            timeout_ms: 100,
            max_compiled_size: 1 << 20,
            cache_capacity: 128,
        }
    }
}

impl EvaluatorConfig {
    /// Load a configuration file; YAML is a superset of JSON so both work
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: EvaluatorConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply `BOTFLOW_*` environment overrides
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = read_override(&lookup, "BOTFLOW_MAX_EXPRESSION_LENGTH")? {
            self.max_expression_length = v as usize;
        }
        if let Some(v) = read_override(&lookup, "BOTFLOW_MAX_DEPTH")? {
            self.max_depth = v as usize;
        }
        if let Some(v) = read_override(&lookup, "BOTFLOW_REGEX_TIMEOUT_MS")? {
            self.regex.timeout_ms = v;
        }
        Ok(self)
    }
}

fn read_override<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.max_expression_length, 1000);
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.regex.timeout_ms, 100);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
max_depth: 32
regex:
  timeout_ms: 250
"#;
        let config = EvaluatorConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.regex.timeout_ms, 250);
        assert_eq!(config.max_expression_length, 1000);
        assert_eq!(config.regex.max_pattern_length, 256);
    }

    #[test]
    fn test_parse_json() {
        let config = EvaluatorConfig::parse_yaml(r#"{"cache_capacity": 0}"#).unwrap();
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result = EvaluatorConfig::parse_yaml("max_lenght: 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BOTFLOW_MAX_EXPRESSION_LENGTH", "500"),
            ("BOTFLOW_REGEX_TIMEOUT_MS", " 20 "),
        ]
        .into_iter()
        .collect();

        let config = EvaluatorConfig::default()
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_expression_length, 500);
        assert_eq!(config.regex.timeout_ms, 20);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_env_override_invalid() {
        let result = EvaluatorConfig::default().apply_overrides(|k| {
            (k == "BOTFLOW_MAX_DEPTH").then(|| "deep".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }
}
