// SPDX-License-Identifier: MIT

//! Safe regular expressions for conditions
//!
//! Patterns are checked statically before they are compiled, compiled with a
//! size limit, and matched on the blocking pool under a timeout.

mod analyzer;
mod service;

pub use analyzer::{analyze, MAX_REPETITION};
pub use service::{RegexService, SafeRegex};
