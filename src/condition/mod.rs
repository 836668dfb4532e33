// SPDX-License-Identifier: MIT

//! Condition expressions for workflow branching
//!
//! This module provides parsing, validation and evaluation of the expressions
//! operators write in the editor, such as:
//! - `intent === 'search'`
//! - `balance > 100 && !isEmpty(phone)`
//! - `Math.max(a, b) >= limit ? 'high' : 'low'`
//!
//! and of structured `{ field, operator, value }` conditions.

pub mod ast;
mod cache;
mod classifier;
mod evaluator;
mod lexer;
mod operator;
mod parser;
mod structured;
mod validator;

pub use ast::{BinaryOperator, Literal, LogicalOperator, MemberProperty, Node, UnaryOperator};
pub use cache::AstCache;
pub use classifier::is_complex_expression;
pub use evaluator::ConditionEvaluator;
pub use operator::{
    apply_operator, compare, contains, evaluate_simple, is_empty, is_not_empty, loose_equals,
    strict_equals, Operator,
};
pub use parser::{check_length, parse, parse_with_limits, DEFAULT_MAX_DEPTH};
pub use structured::Condition;
pub use validator::{validate, ALLOWED_FUNCTIONS, ALLOWED_MATH_FUNCTIONS};
