//! Comparison, membership and ordering
//!
//! Ordering is defined between numbers, between strings and between two
//! lists or two tuples (lexicographic). `in` looks through lists, tuples,
//! strings (substring), sets and dict keys.

use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::Number;
use crate::memory::value::Value;
use crate::parser::ast::{CmpOp, SourceLocation};
use std::cmp::Ordering;

impl Analyzer {
    /// Evaluate a single comparison pair
    pub(crate) fn compare_values(
        op: CmpOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<bool, EvalError> {
        let ordered = |accept: fn(Ordering) -> bool| -> Result<bool, EvalError> {
            Ok(Self::order_values(left, right, op.symbol(), location)?.is_some_and(accept))
        };

        match op {
            CmpOp::Eq => Ok(left.py_eq(right)),
            CmpOp::NotEq => Ok(!left.py_eq(right)),
            CmpOp::Lt => ordered(Ordering::is_lt),
            CmpOp::Le => ordered(Ordering::is_le),
            CmpOp::Gt => ordered(Ordering::is_gt),
            CmpOp::Ge => ordered(Ordering::is_ge),
            CmpOp::In => Self::contains_value(right, left, location),
            CmpOp::NotIn => Ok(!Self::contains_value(right, left, location)?),
            CmpOp::Is => Ok(left.is_same(right)),
            CmpOp::IsNot => Ok(!left.is_same(right)),
        }
    }

    /// Order two values. `Ok(None)` means unordered (a NaN was involved).
    pub(crate) fn order_values(
        left: &Value,
        right: &Value,
        symbol: &str,
        location: SourceLocation,
    ) -> Result<Option<Ordering>, EvalError> {
        if let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) {
            return Ok(match (a, b) {
                (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
                (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
            });
        }

        match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::List(a), Value::List(b)) => {
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                Self::order_sequences(&a, &b, symbol, location)
            }
            (Value::Tuple(a), Value::Tuple(b)) => Self::order_sequences(a, b, symbol, location),
            _ => Err(EvalError::UnsupportedOperator {
                message: format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    symbol,
                    left.type_name(),
                    right.type_name()
                ),
                location,
            }),
        }
    }

    fn order_sequences(
        a: &[Value],
        b: &[Value],
        symbol: &str,
        location: SourceLocation,
    ) -> Result<Option<Ordering>, EvalError> {
        for (x, y) in a.iter().zip(b) {
            if !x.py_eq(y) {
                return Self::order_values(x, y, symbol, location);
            }
        }
        Ok(Some(a.len().cmp(&b.len())))
    }

    /// `item in container`
    pub(crate) fn contains_value(
        container: &Value,
        item: &Value,
        location: SourceLocation,
    ) -> Result<bool, EvalError> {
        match container {
            Value::List(items) => Ok(items.borrow().iter().any(|v| v.py_eq(item))),
            Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
            Value::Str(text) => match item {
                Value::Str(needle) => Ok(text.contains(needle.as_str())),
                other => Err(EvalError::type_mismatch(
                    format!(
                        "'in <string>' requires string as left operand, not {}",
                        other.type_name()
                    ),
                    location,
                )),
            },
            Value::Set(set) => set
                .borrow()
                .contains(item)
                .map_err(|e| EvalError::unhashable(e, location)),
            Value::Dict(dict) => dict
                .borrow()
                .contains(item)
                .map_err(|e| EvalError::unhashable(e, location)),
            other => Err(EvalError::type_mismatch(
                format!("argument of type '{}' is not iterable", other.type_name()),
                location,
            )),
        }
    }

    /// Stable sort; `reverse` keeps equal elements in their original order
    pub(crate) fn sort_values(
        items: &mut [Value],
        reverse: bool,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        let mut failure = None;
        items.sort_by(|a, b| {
            let (first, second) = if reverse { (b, a) } else { (a, b) };
            match Self::order_values(first, second, "<", location) {
                Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
                Err(err) => {
                    failure.get_or_insert(err);
                    Ordering::Equal
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
