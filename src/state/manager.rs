// SPDX-License-Identifier: MIT

use crate::core::error::VariableError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-execution variable store consulted by the evaluator.
///
/// The evaluator only ever calls `get`. Writes belong to the workflow
/// engine's action nodes. Implementations must tolerate
/// concurrent readers for the same execution.
#[async_trait]
pub trait VariableManager: Send + Sync {
    /// Fetch a variable; `None` when it does not exist or has expired
    async fn get(&self, key: &str) -> Result<Option<Value>, VariableError>;

    /// Best-effort synchronous read; must not block, may return `None` when
    /// the value is not immediately available
    fn get_sync(&self, key: &str) -> Option<Value>;

    async fn has(&self, key: &str) -> Result<bool, VariableError>;

    /// Store a variable, optionally expiring after `ttl`
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>)
        -> Result<(), VariableError>;

    /// Remove a variable, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, VariableError>;

    /// Snapshot of all live variables
    async fn list(&self) -> Result<BTreeMap<String, Value>, VariableError>;

    /// Drop expired variables, returning how many were removed
    async fn cleanup_expired(&self) -> Result<usize, VariableError>;
}
