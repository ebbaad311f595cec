//! Evaluation error types for the snippet interpreter
//!
//! This module defines [`EvalError`], which represents every failure that can
//! occur while evaluating an expression (as opposed to syntax errors, which
//! stop the analysis before it starts).
//!
//! Evaluation errors are never fatal: the statement interpreter catches them at
//! the enclosing statement, writes a line to the output log and moves on.

use crate::memory::store::UnhashableKey;
use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Errors that can occur during evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("name '{name}' is not defined at line {}", .location.line)]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Operator applied to operand kinds it does not support
    #[error("{message} at line {}", .location.line)]
    UnsupportedOperator {
        message: String,
        location: SourceLocation,
    },

    #[error("function '{name}' is not supported at line {}", .location.line)]
    UnsupportedFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("'{receiver}' object has no supported method '{method}' at line {}", .location.line)]
    UnsupportedMethod {
        receiver: String,
        method: String,
        location: SourceLocation,
    },

    /// Wrong argument kind or count, unhashable key, integer overflow
    #[error("{message} at line {}", .location.line)]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    #[error("{message} at line {}", .location.line)]
    IndexOutOfRange {
        message: String,
        location: SourceLocation,
    },

    /// `key` is the `repr()` of the missing key
    #[error("key {key} not found at line {}", .location.line)]
    KeyNotFound {
        key: String,
        location: SourceLocation,
    },

    #[error("{message} at line {}", .location.line)]
    DivisionByZero {
        message: String,
        location: SourceLocation,
    },

    /// Right kind, unusable value (`int('abc')`, `max([])`, missing element)
    #[error("{message} at line {}", .location.line)]
    ValueError {
        message: String,
        location: SourceLocation,
    },

    /// A range or repetition would materialize too many elements
    #[error("sequence of {length} elements exceeds the limit of {limit} at line {}", .location.line)]
    RangeTooLarge {
        length: u128,
        limit: usize,
        location: SourceLocation,
    },
}

impl EvalError {
    pub fn location(&self) -> SourceLocation {
        match self {
            EvalError::UndefinedVariable { location, .. }
            | EvalError::UnsupportedOperator { location, .. }
            | EvalError::UnsupportedFunction { location, .. }
            | EvalError::UnsupportedMethod { location, .. }
            | EvalError::TypeMismatch { location, .. }
            | EvalError::IndexOutOfRange { location, .. }
            | EvalError::KeyNotFound { location, .. }
            | EvalError::DivisionByZero { location, .. }
            | EvalError::ValueError { location, .. }
            | EvalError::RangeTooLarge { location, .. } => *location,
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, location: SourceLocation) -> Self {
        EvalError::TypeMismatch {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn value_error(message: impl Into<String>, location: SourceLocation) -> Self {
        EvalError::ValueError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn unhashable(err: UnhashableKey, location: SourceLocation) -> Self {
        EvalError::TypeMismatch {
            message: err.to_string(),
            location,
        }
    }

    pub(crate) fn overflow(location: SourceLocation) -> Self {
        EvalError::TypeMismatch {
            message: "integer overflow".to_string(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line() {
        let err = EvalError::UndefinedVariable {
            name: "total".to_string(),
            location: SourceLocation::new(3, 5),
        };
        assert_eq!(err.to_string(), "name 'total' is not defined at line 3");

        let err = EvalError::KeyNotFound {
            key: "'a'".to_string(),
            location: SourceLocation::new(1, 1),
        };
        assert_eq!(err.to_string(), "key 'a' not found at line 1");
        assert_eq!(err.location().line, 1);
    }
}
