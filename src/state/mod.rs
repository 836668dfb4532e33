// SPDX-License-Identifier: MIT

//! Variable storage for workflow executions
//!
//! This module provides:
//! - `VariableManager` - the interface the evaluator reads variables through
//! - `MemoryVariables` - in-process implementation with per-key expiry

mod manager;
mod memory;

pub use manager::VariableManager;
pub use memory::MemoryVariables;
