pub mod access;
pub mod binary;
pub mod compare;
pub mod unary;

// Operators are `impl Analyzer` blocks; the helpers below are shared by them
// and by the builtin and method tables.

use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;

/// Numeric view of an operand (`bool` participates as an int)
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[inline]
    pub(crate) fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }
}

/// Items produced by iterating `value`, or a type error if it is not iterable
pub(crate) fn iterate(value: &Value, location: SourceLocation) -> Result<Vec<Value>, EvalError> {
    value.iter_values().ok_or_else(|| {
        EvalError::type_mismatch(
            format!("'{}' object is not iterable", value.type_name()),
            location,
        )
    })
}
