// SPDX-License-Identifier: MIT

//! Typed error handling for botflow-conditions
//!
//! Every failure the evaluator can report maps to one [`ErrorKind`], so editors
//! can tell "too long", "not supported" and "syntax error" apart without
//! matching on message text.

use thiserror::Error;

/// Top-level error type for parsing, validating and evaluating conditions
#[derive(Debug, Error)]
pub enum EvalError {
    /// Expression longer than the hard cap; rejected before parsing
    #[error("Expression is {length} characters long, the maximum is {max}")]
    LengthExceeded { length: usize, max: usize },

    /// Text is not valid in the supported grammar
    #[error("Syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    /// Construct outside the allow-list
    #[error("Construct not permitted in conditions: {construct}")]
    Security { construct: String },

    /// Operator string outside the closed operator set
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Runtime failure while walking the tree
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Regex rejected by the safe regex service
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    /// Variable store failure
    #[error(transparent)]
    Variable(#[from] VariableError),

    /// The surrounding run used up its step budget
    #[error("Step budget of {limit} exhausted")]
    StepBudgetExceeded { limit: u64 },
}

/// Coarse classification of an [`EvalError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LengthExceeded,
    Syntax,
    Security,
    UnknownOperator,
    Evaluation,
    InvalidPattern,
    Variable,
    StepBudget,
}

impl EvalError {
    /// Create a syntax error at the given character offset
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create a security error naming the rejected construct
    pub fn security(construct: impl Into<String>) -> Self {
        Self::Security {
            construct: construct.into(),
        }
    }

    /// Create a runtime evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LengthExceeded { .. } => ErrorKind::LengthExceeded,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Security { .. } => ErrorKind::Security,
            Self::UnknownOperator(_) => ErrorKind::UnknownOperator,
            Self::Evaluation(_) => ErrorKind::Evaluation,
            Self::InvalidPattern(_) => ErrorKind::InvalidPattern,
            Self::Variable(_) => ErrorKind::Variable,
            Self::StepBudgetExceeded { .. } => ErrorKind::StepBudget,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::LengthExceeded => write!(f, "too_long"),
            ErrorKind::Syntax => write!(f, "syntax_error"),
            ErrorKind::Security => write!(f, "not_permitted"),
            ErrorKind::UnknownOperator => write!(f, "unknown_operator"),
            ErrorKind::Evaluation => write!(f, "evaluation_error"),
            ErrorKind::InvalidPattern => write!(f, "invalid_pattern"),
            ErrorKind::Variable => write!(f, "variable_error"),
            ErrorKind::StepBudget => write!(f, "step_budget_exceeded"),
        }
    }
}

/// Reasons the safe regex service refuses a pattern or a match
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern is {length} characters long, the maximum is {max}")]
    TooLong { length: usize, max: usize },

    #[error("nested unbounded quantifier near position {0}")]
    NestedQuantifier(usize),

    #[error("quantified alternation with overlapping branches near position {0}")]
    OverlappingAlternation(usize),

    #[error("repetition bound {0} exceeds the allowed maximum")]
    ExcessiveRepetition(u32),

    #[error("{0}")]
    Invalid(String),

    #[error("input is {length} characters long, the maximum is {max}")]
    InputTooLong { length: usize, max: usize },

    #[error("match did not finish within {0} ms")]
    Timeout(u64),
}

/// Variable store failures
#[derive(Debug, Error)]
pub enum VariableError {
    /// Backing store could not be reached or answered with an error
    #[error("Variable store error: {0}")]
    Backend(String),

    /// Value could not be encoded or decoded
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_distinguishes_editor_categories() {
        let too_long = EvalError::LengthExceeded {
            length: 1001,
            max: 1000,
        };
        let syntax = EvalError::syntax("unexpected end of expression", 3);
        let security = EvalError::security("FunctionDeclaration");

        assert_eq!(too_long.kind(), ErrorKind::LengthExceeded);
        assert_eq!(syntax.kind(), ErrorKind::Syntax);
        assert_eq!(security.kind(), ErrorKind::Security);
        assert_eq!(too_long.kind().to_string(), "too_long");
        assert_eq!(security.kind().to_string(), "not_permitted");
    }

    #[test]
    fn test_messages() {
        let err = EvalError::syntax("expected ')'", 7);
        assert_eq!(err.to_string(), "Syntax error at position 7: expected ')'");

        let err = EvalError::UnknownOperator("between".to_string());
        assert_eq!(err.to_string(), "Unknown operator: between");
    }

    #[test]
    fn test_pattern_error_converts() {
        let err: EvalError = PatternError::NestedQuantifier(4).into();
        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
        assert!(err.to_string().contains("nested unbounded quantifier"));
    }
}
