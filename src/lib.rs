// SPDX-License-Identifier: MIT

//! Condition and expression evaluation for workflow bots
//!
//! - [`condition`] parses, validates and evaluates expressions
//! - [`pattern`] validates and runs regular expressions in bounded time
//! - [`state`] is the per-execution variable store the evaluator reads
//! - [`core`] holds values, errors, configuration and the execution context

pub mod condition;
pub mod core;
pub mod pattern;
pub mod state;

pub use crate::condition::{
    evaluate_simple, is_complex_expression, parse, validate, Condition, ConditionEvaluator,
    Operator,
};
pub use crate::core::config::{EvaluatorConfig, RegexConfig};
pub use crate::core::context::ExecutionContext;
pub use crate::core::error::{ErrorKind, EvalError, PatternError, VariableError};
pub use crate::core::value::Value;
pub use crate::pattern::{RegexService, SafeRegex};
pub use crate::state::{MemoryVariables, VariableManager};
