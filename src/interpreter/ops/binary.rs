//! Binary operator evaluation
//!
//! Numbers follow the usual promotion rules: int∘int stays int except for true
//! division, anything involving a float is computed in floating point, and
//! `bool` behaves as an int. `//` and `%` round toward negative infinity.
//! Sequences support `+` (concatenation) and `*` (repetition), sets support
//! `| & ^ -`.

use crate::interpreter::constants::MAX_SEQUENCE_LEN;
use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::Number;
use crate::memory::store::SetStore;
use crate::memory::value::Value;
use crate::parser::ast::{BinOp, SourceLocation};

impl Analyzer {
    pub(crate) fn evaluate_binary_op(
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        if let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) {
            // bool ∘ bool stays bool for the bitwise operators
            if let (Value::Bool(x), Value::Bool(y)) = (left, right) {
                match op {
                    BinOp::BitAnd => return Ok(Value::Bool(x & y)),
                    BinOp::BitOr => return Ok(Value::Bool(x | y)),
                    BinOp::BitXor => return Ok(Value::Bool(x ^ y)),
                    _ => {}
                }
            }
            return match (a, b) {
                (Number::Int(a), Number::Int(b)) => Self::int_binary_op(op, a, b, location),
                (a, b) => Self::float_binary_op(op, a.to_f64(), b.to_f64(), left, right, location),
            };
        }

        match (op, left, right) {
            (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (BinOp::Add, Value::List(a), Value::List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
                Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
            }
            (BinOp::Mul, sequence, count) | (BinOp::Mul, count, sequence)
                if count.as_int().is_some() && is_sequence(sequence) =>
            {
                Self::repeat_sequence(sequence, count.as_int().unwrap_or(0), location)
            }
            (
                BinOp::BitOr | BinOp::BitAnd | BinOp::BitXor | BinOp::Sub,
                Value::Set(a),
                Value::Set(b),
            ) => {
                let (a, b) = (a.borrow(), b.borrow());
                let combined: Vec<Value> = match op {
                    BinOp::BitOr => a.values().chain(b.values()).cloned().collect(),
                    BinOp::BitAnd => a
                        .values()
                        .filter(|v| b.contains(v).unwrap_or(false))
                        .cloned()
                        .collect(),
                    BinOp::Sub => a
                        .values()
                        .filter(|v| !b.contains(v).unwrap_or(false))
                        .cloned()
                        .collect(),
                    _ => a
                        .values()
                        .filter(|v| !b.contains(v).unwrap_or(false))
                        .chain(b.values().filter(|v| !a.contains(v).unwrap_or(false)))
                        .cloned()
                        .collect(),
                };
                SetStore::from_values(combined)
                    .map(Value::set)
                    .map_err(|e| EvalError::unhashable(e, location))
            }
            _ => Err(unsupported_operands(op, left, right, location)),
        }
    }

    #[inline]
    fn int_binary_op(op: BinOp, a: i64, b: i64, location: SourceLocation) -> Result<Value, EvalError> {
        let overflow = || EvalError::overflow(location);
        let zero = |message: &str| EvalError::DivisionByZero {
            message: message.to_string(),
            location,
        };

        let result = match op {
            BinOp::Add => a.checked_add(b).ok_or_else(overflow)?,
            BinOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
            BinOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
            BinOp::Div => {
                if b == 0 {
                    return Err(zero("division by zero"));
                }
                return Ok(Value::Float(a as f64 / b as f64));
            }
            BinOp::FloorDiv => {
                if b == 0 {
                    return Err(zero("integer division or modulo by zero"));
                }
                floor_div(a, b).ok_or_else(overflow)?
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(zero("integer modulo by zero"));
                }
                floor_mod(a, b).ok_or_else(overflow)?
            }
            BinOp::Pow => return int_pow(a, b, location),
            BinOp::BitAnd => a & b,
            BinOp::BitOr => a | b,
            BinOp::BitXor => a ^ b,
            BinOp::Shl => {
                if b < 0 {
                    return Err(EvalError::value_error("negative shift count", location));
                }
                if a == 0 {
                    0
                } else if b >= 64 {
                    return Err(overflow());
                } else {
                    let shifted = a << b;
                    if shifted >> b != a {
                        return Err(overflow());
                    }
                    shifted
                }
            }
            BinOp::Shr => {
                if b < 0 {
                    return Err(EvalError::value_error("negative shift count", location));
                }
                if b >= 64 {
                    if a < 0 {
                        -1
                    } else {
                        0
                    }
                } else {
                    a >> b
                }
            }
        };

        Ok(Value::Int(result))
    }

    #[inline]
    fn float_binary_op(
        op: BinOp,
        a: f64,
        b: f64,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let zero = |message: &str| EvalError::DivisionByZero {
            message: message.to_string(),
            location,
        };

        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                if b == 0.0 {
                    return Err(zero("float division by zero"));
                }
                a / b
            }
            BinOp::FloorDiv => {
                if b == 0.0 {
                    return Err(zero("float floor division by zero"));
                }
                (a / b).floor()
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(zero("float modulo"));
                }
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else {
                    r
                }
            }
            BinOp::Pow => {
                if a == 0.0 && b < 0.0 {
                    return Err(zero("0.0 cannot be raised to a negative power"));
                }
                if a < 0.0 && b.fract() != 0.0 {
                    return Err(EvalError::value_error(
                        "negative number cannot be raised to a fractional power",
                        location,
                    ));
                }
                a.powf(b)
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                return Err(unsupported_operands(op, left, right, location));
            }
        };

        Ok(Value::Float(result))
    }

    fn repeat_sequence(
        sequence: &Value,
        count: i64,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let count = usize::try_from(count).unwrap_or(0);
        let unit = match sequence {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.borrow().len(),
            Value::Tuple(items) => items.len(),
            _ => 0,
        };
        let length = unit as u128 * count as u128;
        if length > MAX_SEQUENCE_LEN as u128 {
            return Err(EvalError::RangeTooLarge {
                length,
                limit: MAX_SEQUENCE_LEN,
                location,
            });
        }

        Ok(match sequence {
            Value::Str(s) => Value::Str(s.repeat(count)),
            Value::List(items) => {
                let items = items.borrow();
                Value::list(items.iter().cloned().cycle().take(items.len() * count).collect())
            }
            Value::Tuple(items) => {
                Value::tuple(items.iter().cloned().cycle().take(items.len() * count).collect())
            }
            other => other.clone(),
        })
    }
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

fn unsupported_operands(op: BinOp, left: &Value, right: &Value, location: SourceLocation) -> EvalError {
    EvalError::UnsupportedOperator {
        message: format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        location,
    }
}

/// Quotient rounded toward negative infinity
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn int_pow(base: i64, exponent: i64, location: SourceLocation) -> Result<Value, EvalError> {
    if exponent < 0 {
        if base == 0 {
            return Err(EvalError::DivisionByZero {
                message: "0.0 cannot be raised to a negative power".to_string(),
                location,
            });
        }
        return Ok(Value::Float((base as f64).powf(exponent as f64)));
    }

    let result = match base {
        0 => Some(if exponent == 0 { 1 } else { 0 }),
        1 => Some(1),
        -1 => Some(if exponent % 2 == 0 { 1 } else { -1 }),
        _ => u32::try_from(exponent).ok().and_then(|e| base.checked_pow(e)),
    };

    result
        .map(Value::Int)
        .ok_or_else(|| EvalError::overflow(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(op: BinOp, left: Value, right: Value) -> Result<Value, EvalError> {
        Analyzer::evaluate_binary_op(op, &left, &right, SourceLocation::default())
    }

    fn text(op: BinOp, left: Value, right: Value) -> String {
        eval(op, left, right).unwrap().repr()
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(text(BinOp::Div, Value::Int(7), Value::Int(2)), "3.5");
        assert_eq!(text(BinOp::Div, Value::Int(4), Value::Int(2)), "2.0");
    }

    #[test]
    fn test_floor_semantics() {
        assert_eq!(text(BinOp::FloorDiv, Value::Int(-7), Value::Int(2)), "-4");
        assert_eq!(text(BinOp::Mod, Value::Int(-7), Value::Int(2)), "1");
        assert_eq!(text(BinOp::Mod, Value::Int(7), Value::Int(-2)), "-1");
        assert_eq!(text(BinOp::Mod, Value::Float(-7.5), Value::Int(2)), "0.5");
    }

    #[test]
    fn test_power() {
        assert_eq!(text(BinOp::Pow, Value::Int(2), Value::Int(10)), "1024");
        assert_eq!(text(BinOp::Pow, Value::Int(2), Value::Int(-1)), "0.5");
        assert!(matches!(
            eval(BinOp::Pow, Value::Int(10), Value::Int(40)),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval(BinOp::Mod, Value::Int(1), Value::Int(0)),
            Err(EvalError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval(BinOp::Div, Value::Float(1.0), Value::Int(0)),
            Err(EvalError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = eval(BinOp::Add, Value::Int(i64::MAX), Value::Int(1)).unwrap_err();
        assert!(err.to_string().contains("integer overflow"));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(text(BinOp::Add, Value::str("ab"), Value::str("c")), "'abc'");
        assert_eq!(text(BinOp::Mul, Value::str("ab"), Value::Int(3)), "'ababab'");
        assert_eq!(text(BinOp::Mul, Value::Int(2), Value::list(vec![Value::Int(0)])), "[0, 0]");
        assert_eq!(
            text(BinOp::Add, Value::list(vec![Value::Int(1)]), Value::list(vec![Value::Int(2)])),
            "[1, 2]"
        );
    }

    #[test]
    fn test_xor_and_bool_arithmetic() {
        assert_eq!(text(BinOp::BitXor, Value::Int(5), Value::Int(3)), "6");
        assert_eq!(text(BinOp::Add, Value::Bool(true), Value::Int(1)), "2");
        assert_eq!(text(BinOp::BitXor, Value::Bool(true), Value::Bool(true)), "False");
    }

    #[test]
    fn test_unsupported_operands() {
        let err = eval(BinOp::Add, Value::Int(1), Value::str("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'int' and 'str' at line 0"
        );
    }
}
