// SPDX-License-Identifier: MIT

//! In-memory variable store with optional expiry

use super::manager::VariableManager;
use crate::core::context::{Clock, SystemClock};
use crate::core::error::VariableError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at > now).unwrap_or(true)
    }
}

/// Variable store kept in process memory.
///
/// Cloning shares the underlying map, so parallel branches of one execution
/// can hold their own handle.
#[derive(Clone)]
pub struct MemoryVariables {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryVariables {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store that measures expiry against the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Seed a store from the top-level keys of a JSON object.
    /// Non-object input yields an empty store.
    pub fn from_json(initial: Value) -> Self {
        let mut entries = HashMap::new();
        if let Value::Object(map) = initial {
            for (k, v) in map {
                entries.insert(
                    k,
                    Entry {
                        value: v,
                        expires_at: None,
                    },
                );
            }
        }
        Self {
            entries: Arc::new(RwLock::new(entries)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Get a nested value using dot notation (e.g., "user.profile.name")
    pub async fn get_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let root = parts.next()?;

        let entries = self.entries.read().await;
        let entry = entries.get(root)?;
        if !entry.is_live(self.clock.now()) {
            return None;
        }

        let mut current = &entry.value;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current.clone())
    }
}

impl Default for MemoryVariables {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VariableManager for MemoryVariables {
    async fn get(&self, key: &str) -> Result<Option<Value>, VariableError> {
        let entries = self.entries.read().await;
        let now = self.clock.now();
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    fn get_sync(&self, key: &str) -> Option<Value> {
        // A writer holding the lock means the value is in flux; report nothing
        let entries = self.entries.try_read().ok()?;
        let now = self.clock.now();
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    async fn has(&self, key: &str) -> Result<bool, VariableError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), VariableError> {
        let expires_at = match ttl {
            Some(ttl) => {
                let delta = chrono::Duration::from_std(ttl)
                    .map_err(|e| VariableError::Backend(format!("invalid ttl: {}", e)))?;
                self.clock.now().checked_add_signed(delta)
            }
            None => None,
        };

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, VariableError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some())
    }

    async fn list(&self) -> Result<BTreeMap<String, Value>, VariableError> {
        let entries = self.entries.read().await;
        let now = self.clock.now();
        Ok(entries
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect())
    }

    async fn cleanup_expired(&self) -> Result<usize, VariableError> {
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Removed {} expired variables", removed);
        }
        Ok(removed)
    }
}
