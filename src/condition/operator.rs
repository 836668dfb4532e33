// SPDX-License-Identifier: MIT

//! Closed operator set for structured conditions
//!
//! Editors send operator names as strings; they are mapped to [`Operator`] at
//! the boundary, so an unknown spelling fails once instead of silently
//! evaluating to `false`.

use crate::core::error::EvalError;
use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operators for simple conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::Greater,
        Operator::Less,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
    ];

    /// Canonical name used when serializing
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }
}

impl FromStr for Operator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" | "===" | "==" => Ok(Operator::Equals),
            "not_equals" | "!==" => Ok(Operator::NotEquals),
            "contains" => Ok(Operator::Contains),
            "not_contains" => Ok(Operator::NotContains),
            "greater" | ">" => Ok(Operator::Greater),
            "less" | "<" => Ok(Operator::Less),
            ">=" => Ok(Operator::GreaterOrEqual),
            "<=" => Ok(Operator::LessOrEqual),
            "is_empty" => Ok(Operator::IsEmpty),
            "is_not_empty" => Ok(Operator::IsNotEmpty),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply an operator given by name; fails only for unknown operator names
pub fn evaluate_simple(
    left: &Value,
    operator: &str,
    right: &Value,
    case_sensitive: bool,
) -> Result<Value, EvalError> {
    let operator: Operator = operator.parse()?;
    Ok(apply_operator(left, operator, right, case_sensitive))
}

/// Apply a typed operator to two resolved values
pub fn apply_operator(
    left: &Value,
    operator: Operator,
    right: &Value,
    case_sensitive: bool,
) -> Value {
    match operator {
        Operator::Equals => Value::Bool(strict_equals(left, right)),
        Operator::NotEquals => Value::Bool(!strict_equals(left, right)),
        Operator::Contains => Value::Bool(contains(left, right, case_sensitive)),
        Operator::NotContains => Value::Bool(!contains(left, right, case_sensitive)),
        Operator::Greater => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        Operator::Less => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        Operator::GreaterOrEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        Operator::LessOrEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Operator::IsEmpty => Value::Bool(is_empty(left)),
        Operator::IsNotEmpty => is_not_empty(left),
    }
}

/// Same type and same value; `NaN` equals nothing, composites compare
/// element by element
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    left == right
}

/// Strict equality where `null` and `undefined` also equal each other
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    (left.is_nullish() && right.is_nullish()) || strict_equals(left, right)
}

/// Substring test on the display forms of both operands
pub fn contains(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    let haystack = left.to_display_string();
    let needle = right.to_display_string();
    if case_sensitive {
        haystack.contains(&needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Two strings order lexicographically, anything else numerically; `None`
/// when either side is not a number
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// `null`, `undefined`, `""` and whitespace-only strings
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// The value itself when it is not empty. Empty `null`, `undefined` and `""`
/// come back unchanged, whitespace-only strings become `false`.
pub fn is_not_empty(value: &Value) -> Value {
    match value {
        Value::String(s) if !s.is_empty() && s.trim().is_empty() => Value::Bool(false),
        other => other.clone(),
    }
}
