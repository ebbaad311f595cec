//! Unary operator evaluation

use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Analyzer {
    pub(crate) fn evaluate_unary_op(
        op: UnaryOp,
        operand: &Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match (op, operand) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),

            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::overflow(location)),
            (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
            (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),

            (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
            (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),

            (UnaryOp::Invert, Value::Int(n)) => Ok(Value::Int(!n)),
            (UnaryOp::Invert, Value::Bool(b)) => Ok(Value::Int(!i64::from(*b))),

            (op, value) => Err(EvalError::UnsupportedOperator {
                message: format!(
                    "bad operand type for unary {}: '{}'",
                    op.symbol(),
                    value.type_name()
                ),
                location,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
        Analyzer::evaluate_unary_op(op, &operand, SourceLocation::default())
    }

    #[test]
    fn test_negation_and_identity() {
        assert_eq!(eval(UnaryOp::Neg, Value::Int(5)).unwrap().repr(), "-5");
        assert_eq!(eval(UnaryOp::Neg, Value::Float(2.5)).unwrap().repr(), "-2.5");
        assert_eq!(eval(UnaryOp::Pos, Value::Bool(true)).unwrap().repr(), "1");
        assert_eq!(eval(UnaryOp::Invert, Value::Int(5)).unwrap().repr(), "-6");
    }

    #[test]
    fn test_not_uses_truthiness() {
        assert_eq!(eval(UnaryOp::Not, Value::list(vec![])).unwrap().repr(), "True");
        assert_eq!(eval(UnaryOp::Not, Value::str("x")).unwrap().repr(), "False");
    }

    #[test]
    fn test_negating_text_fails() {
        let err = eval(UnaryOp::Neg, Value::str("a")).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedOperator { .. }));
        assert!(err.to_string().starts_with("bad operand type for unary -: 'str'"));
    }

    #[test]
    fn test_negating_min_int_overflows() {
        assert!(eval(UnaryOp::Neg, Value::Int(i64::MIN)).is_err());
    }
}
