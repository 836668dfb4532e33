// SPDX-License-Identifier: MIT

//! Execution context handed to the evaluator by the workflow engine

use crate::core::error::EvalError;
use crate::state::VariableManager;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Time source; injectable so expiry can be tested deterministically
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Step counter bounding the total work of one workflow run.
///
/// Ticked by the workflow engine once per executed node; the evaluator never
/// ticks it.
#[derive(Debug)]
pub struct StepBudget {
    steps: AtomicU64,
    max_steps: u64,
}

impl StepBudget {
    pub fn new(max_steps: u64) -> Self {
        Self {
            steps: AtomicU64::new(0),
            max_steps,
        }
    }

    /// Count one step, failing once the budget is spent
    pub fn tick(&self) -> Result<u64, EvalError> {
        let step = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        if step > self.max_steps {
            return Err(EvalError::StepBudgetExceeded {
                limit: self.max_steps,
            });
        }
        Ok(step)
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn max_steps(&self) -> u64 {
        self.max_steps
    }

    pub fn remaining(&self) -> u64 {
        self.max_steps.saturating_sub(self.steps())
    }
}

/// Logger that tags every record with the execution it belongs to
#[derive(Debug, Clone)]
pub struct ExecutionLogger {
    execution_id: String,
}

impl ExecutionLogger {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
        }
    }

    pub fn debug(&self, message: &str) {
        log::debug!("[execution={}] {}", self.execution_id, message);
    }

    pub fn info(&self, message: &str) {
        log::info!("[execution={}] {}", self.execution_id, message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!("[execution={}] {}", self.execution_id, message);
    }

    pub fn error(&self, message: &str) {
        log::error!("[execution={}] {}", self.execution_id, message);
    }
}

/// Type-keyed bag of injected services (database pools, HTTP clients).
/// Used by action nodes; conditions never reach into it.
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: Arc<T>) {
        self.entries.insert(name.into(), service);
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()?.downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything one workflow step knows about the run it belongs to
#[derive(Clone)]
pub struct ExecutionContext {
    pub execution_id: String,
    pub project_id: String,
    pub workflow_id: String,
    pub version: u32,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub variables: Arc<dyn VariableManager>,
    pub budget: Arc<StepBudget>,
    pub clock: Arc<dyn Clock>,
    pub logger: ExecutionLogger,
    pub services: Services,
}

/// Default step budget for a run
pub const DEFAULT_MAX_STEPS: u64 = 1_000;

impl ExecutionContext {
    /// Create a context with a fresh step budget, the system clock and no services
    pub fn new(
        execution_id: impl Into<String>,
        project_id: impl Into<String>,
        workflow_id: impl Into<String>,
        version: u32,
        variables: Arc<dyn VariableManager>,
    ) -> Self {
        let execution_id = execution_id.into();
        Self {
            logger: ExecutionLogger::new(execution_id.clone()),
            execution_id,
            project_id: project_id.into(),
            workflow_id: workflow_id.into(),
            version,
            session_id: None,
            user_id: None,
            variables,
            budget: Arc::new(StepBudget::new(DEFAULT_MAX_STEPS)),
            clock: Arc::new(SystemClock),
            services: Services::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.budget = Arc::new(StepBudget::new(max_steps));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryVariables;

    #[test]
    fn test_step_budget() {
        let budget = StepBudget::new(2);
        assert_eq!(budget.tick().unwrap(), 1);
        assert_eq!(budget.tick().unwrap(), 2);
        assert_eq!(budget.remaining(), 0);

        let err = budget.tick().unwrap_err();
        assert!(matches!(err, EvalError::StepBudgetExceeded { limit: 2 }));
    }

    #[test]
    fn test_manual_clock() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_services_lookup_by_type() {
        struct HttpClient {
            base_url: String,
        }

        let mut services = Services::new();
        services.insert(
            "http",
            Arc::new(HttpClient {
                base_url: "https://api.example.com".to_string(),
            }),
        );

        let client = services.get::<HttpClient>("http").unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
        assert!(services.get::<String>("http").is_none());
        assert!(services.get::<HttpClient>("db").is_none());
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_context_builder() {
        let ctx = ExecutionContext::new(
            "exec-1",
            "project-1",
            "workflow-1",
            3,
            Arc::new(MemoryVariables::new()),
        )
        .with_session("session-9")
        .with_user("user-7")
        .with_max_steps(10);

        assert_eq!(ctx.execution_id, "exec-1");
        assert_eq!(ctx.version, 3);
        assert_eq!(ctx.session_id.as_deref(), Some("session-9"));
        assert_eq!(ctx.user_id.as_deref(), Some("user-7"));
        assert_eq!(ctx.budget.max_steps(), 10);
        assert!(ctx.services.is_empty());
    }
}
