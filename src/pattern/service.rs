// SPDX-License-Identifier: MIT

use super::analyzer::analyze;
use crate::core::config::RegexConfig;
use crate::core::error::PatternError;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Pattern validation and bounded-time matching
#[async_trait]
pub trait RegexService: Send + Sync {
    /// Reject patterns that are too long, risky, or do not compile
    fn validate(&self, pattern: &str) -> Result<(), PatternError>;

    /// Match `input` against `pattern`; any refusal or timeout is `false`
    async fn safe_test(&self, pattern: &str, input: &str) -> bool;
}

/// Default [`RegexService`] built on the linear-time `regex` crate
pub struct SafeRegex {
    config: RegexConfig,
    compiled: RwLock<HashMap<String, Regex>>,
}

impl SafeRegex {
    pub fn new(config: RegexConfig) -> Self {
        Self {
            config,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RegexConfig {
        &self.config
    }

    /// Validate and compile, reusing earlier compilations
    pub fn compile(&self, pattern: &str) -> Result<Regex, PatternError> {
        if let Ok(cache) = self.compiled.read() {
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        analyze(pattern, self.config.max_pattern_length)?;
        let regex = RegexBuilder::new(pattern)
            .size_limit(self.config.max_compiled_size)
            .dfa_size_limit(self.config.max_compiled_size)
            .build()
            .map_err(|e| PatternError::Invalid(e.to_string()))?;

        if let Ok(mut cache) = self.compiled.write() {
            if cache.len() >= self.config.cache_capacity {
                cache.clear();
            }
            if self.config.cache_capacity > 0 {
                cache.insert(pattern.to_string(), regex.clone());
            }
        }

        Ok(regex)
    }

    /// Like [`RegexService::safe_test`], but reports why a match was refused
    pub async fn try_match(&self, pattern: &str, input: &str) -> Result<bool, PatternError> {
        let length = input.chars().count();
        if length > self.config.max_input_length {
            return Err(PatternError::InputTooLong {
                length,
                max: self.config.max_input_length,
            });
        }

        let regex = self.compile(pattern)?;
        let input = input.to_string();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let task = tokio::task::spawn_blocking(move || regex.is_match(&input));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(matched)) => Ok(matched),
            Ok(Err(e)) => Err(PatternError::Invalid(format!("match task failed: {}", e))),
            Err(_) => Err(PatternError::Timeout(self.config.timeout_ms)),
        }
    }

    pub fn cached_patterns(&self) -> usize {
        self.compiled.read().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Default for SafeRegex {
    fn default() -> Self {
        Self::new(RegexConfig::default())
    }
}

#[async_trait]
impl RegexService for SafeRegex {
    fn validate(&self, pattern: &str) -> Result<(), PatternError> {
        self.compile(pattern).map(|_| ())
    }

    async fn safe_test(&self, pattern: &str, input: &str) -> bool {
        match self.try_match(pattern, input).await {
            Ok(matched) => matched,
            Err(e) => {
                log::warn!("Regex refused for pattern {:?}: {}", pattern, e);
                false
            }
        }
    }
}
