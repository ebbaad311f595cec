//! Expression evaluation implementation
//!
//! This module handles evaluation of every expression node:
//!
//! - Literals and container displays (evaluated eagerly, left to right)
//! - Names, looked up in the flat analysis context
//! - Binary, unary and boolean operators
//! - Chained comparisons, evaluated lazily pair by pair
//! - Conditional expressions (only the chosen branch runs)
//! - Subscripts and slices
//! - Built-in function calls and method calls
//!
//! # Index log
//!
//! Outside silent mode, a successful read `name[...]` appends an `access`
//! operation to the index log. The index is evaluated once; the positions are
//! those [`Analyzer::resolve_indices`] derives from that value, not those of
//! the container.

use crate::interpreter::builtins::CallArgs;
use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::access::SubscriptKey;
use crate::memory::store::{DictStore, SetStore};
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Analyzer {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Int(n, _) => Ok(Value::Int(*n)),
            Expr::Float(x, _) => Ok(Value::Float(*x)),
            Expr::Str(s, _) => Ok(Value::str(s.as_str())),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::NoneLiteral(_) => Ok(Value::None),

            Expr::Name(name, location) => {
                self.context
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable {
                        name: name.clone(),
                        location: *location,
                    })
            }

            Expr::List { elements, .. } => Ok(Value::list(self.evaluate_all(elements)?)),
            Expr::Tuple { elements, .. } => Ok(Value::tuple(self.evaluate_all(elements)?)),
            Expr::Set { elements, location } => {
                let items = self.evaluate_all(elements)?;
                SetStore::from_values(items)
                    .map(Value::set)
                    .map_err(|e| EvalError::unhashable(e, *location))
            }
            Expr::Dict { entries, location } => {
                let mut dict = DictStore::new();
                for (key, value) in entries {
                    let key = self.evaluate_expr(key)?;
                    let value = self.evaluate_expr(value)?;
                    dict.insert(key, value)
                        .map_err(|e| EvalError::unhashable(e, *location))?;
                }
                Ok(Value::dict(dict))
            }

            Expr::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let left = self.evaluate_expr(left)?;
                let right = self.evaluate_expr(right)?;
                Self::evaluate_binary_op(*op, &left, &right, *location)
            }

            Expr::UnaryOp {
                op,
                operand,
                location,
            } => {
                let operand = self.evaluate_expr(operand)?;
                Self::evaluate_unary_op(*op, &operand, *location)
            }

            Expr::BoolOp { op, values, .. } => self.evaluate_bool_op(*op, values),

            Expr::Compare {
                left,
                comparisons,
                location,
            } => self.evaluate_compare(left, comparisons, *location),

            Expr::IfExp {
                test, body, orelse, ..
            } => {
                if self.evaluate_expr(test)?.is_truthy() {
                    self.evaluate_expr(body)
                } else {
                    self.evaluate_expr(orelse)
                }
            }

            Expr::Call {
                func,
                args,
                keywords,
                location,
            } => {
                let args = self.evaluate_arguments(func, args, keywords, *location)?;
                self.call_builtin(args)
            }

            Expr::MethodCall {
                receiver,
                method,
                args,
                keywords,
                location,
            } => {
                let receiver = self.evaluate_expr(receiver)?;
                let args = self.evaluate_arguments(method, args, keywords, *location)?;
                Self::call_method(&receiver, args)
            }

            Expr::Subscript {
                value,
                index,
                location,
            } => {
                let base = self.evaluate_expr(value)?;
                let key = self.evaluate_subscript_key(index)?;
                let result = Self::read_subscript(&base, &key, *location)?;

                if !self.silent {
                    if let Expr::Name(name, _) = value.as_ref() {
                        self.index_log
                            .record_access(name, Self::resolve_indices(&key));
                    }
                }
                Ok(result)
            }

            Expr::Slice { location, .. } => Err(EvalError::type_mismatch(
                "slice outside of a subscript",
                *location,
            )),
        }
    }

    /// Evaluate with index logging suppressed; used for subscript targets and
    /// dependency formulas
    pub(crate) fn evaluate_silently(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.silently(|analyzer| analyzer.evaluate_expr(expr))
    }

    pub(crate) fn silently<T>(&mut self, run: impl FnOnce(&mut Self) -> T) -> T {
        let was_silent = std::mem::replace(&mut self.silent, true);
        let result = run(self);
        self.silent = was_silent;
        result
    }

    /// Evaluate the inside of `[...]` once: a slice gives its bounds, anything
    /// else its value
    pub(crate) fn evaluate_subscript_key(&mut self, index: &Expr) -> Result<SubscriptKey, EvalError> {
        match index {
            Expr::Slice {
                lower, upper, step, ..
            } => Ok(SubscriptKey::Slice {
                lower: self.slice_bound(lower.as_deref())?,
                upper: self.slice_bound(upper.as_deref())?,
                step: self.slice_bound(step.as_deref())?,
            }),
            key => self.evaluate_expr(key).map(SubscriptKey::Key),
        }
    }

    fn evaluate_all(&mut self, elements: &[Expr]) -> Result<Vec<Value>, EvalError> {
        elements.iter().map(|e| self.evaluate_expr(e)).collect()
    }

    fn evaluate_arguments(
        &mut self,
        name: &str,
        args: &[Expr],
        keywords: &[Keyword],
        location: SourceLocation,
    ) -> Result<CallArgs, EvalError> {
        let mut call = CallArgs::new(name, self.evaluate_all(args)?, location);
        for keyword in keywords {
            let value = self.evaluate_expr(&keyword.value)?;
            call.keywords.push((keyword.name.clone(), value));
        }
        Ok(call)
    }

    /// `a and b and c` / `a or b or c`: the deciding operand is the result
    fn evaluate_bool_op(&mut self, op: BoolOp, values: &[Expr]) -> Result<Value, EvalError> {
        let mut last = Value::None;
        for expr in values {
            last = self.evaluate_expr(expr)?;
            let decided = match op {
                BoolOp::And => !last.is_truthy(),
                BoolOp::Or => last.is_truthy(),
            };
            if decided {
                break;
            }
        }
        Ok(last)
    }

    /// `a < b < c`: each comparator is evaluated only when every earlier
    /// pair held
    fn evaluate_compare(
        &mut self,
        left: &Expr,
        comparisons: &[(CmpOp, Expr)],
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let mut current = self.evaluate_expr(left)?;
        for (op, comparator) in comparisons {
            let right = self.evaluate_expr(comparator)?;
            if !Self::compare_values(*op, &current, &right, location)? {
                return Ok(Value::Bool(false));
            }
            current = right;
        }
        Ok(Value::Bool(true))
    }

    /// One slice bound: omitted or `None` gives `None`
    fn slice_bound(&mut self, bound: Option<&Expr>) -> Result<Option<i64>, EvalError> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.evaluate_expr(expr)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                EvalError::type_mismatch(
                    "slice indices must be integers or None",
                    expr.location(),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    /// Evaluate the value of the last line of `source` after running the rest
    fn eval(source: &str) -> Result<Value, EvalError> {
        let program = parse_source(source).unwrap();
        let (last, setup) = program.body.split_last().unwrap();
        let mut analyzer = Analyzer::new();
        analyzer.execute_block(setup);
        match last {
            Stmt::Expr { expr, .. } => analyzer.evaluate_expr(expr),
            other => panic!("expected an expression, got {other:?}"),
        }
    }

    fn repr(source: &str) -> String {
        eval(source).unwrap().repr()
    }

    #[test]
    fn test_literals_and_displays() {
        assert_eq!(repr("[1, 'a', 2.5, None, True]"), "[1, 'a', 2.5, None, True]");
        assert_eq!(repr("{'a': 1, 'b': 2, 'a': 3}"), "{'a': 3, 'b': 2}");
        assert_eq!(repr("{3, 1, 3}"), "{3, 1}");
        assert_eq!(repr("(1,)"), "(1,)");
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(repr("2 + 3 * 4 ** 2"), "50");
        assert_eq!(repr("-2 ** 2"), "-4");
        assert_eq!(repr("7 // 2 + 7 % 3 / 2"), "3.5");
    }

    #[test]
    fn test_bool_ops_return_deciding_operand() {
        assert_eq!(repr("0 or '' or [1]"), "[1]");
        assert_eq!(repr("1 and 0 and undefined"), "0");
        assert_eq!(repr("[] and 5"), "[]");
    }

    #[test]
    fn test_chained_comparison_is_lazy() {
        assert_eq!(repr("1 < 2 < 3"), "True");
        assert_eq!(repr("3 < 2 < undefined"), "False");
        assert!(eval("1 < 2 < undefined").is_err());
    }

    #[test]
    fn test_conditional_expression() {
        assert_eq!(repr("'yes' if 2 > 1 else undefined"), "'yes'");
    }

    #[test]
    fn test_subscripts_and_slices() {
        assert_eq!(repr("nums = [1, 2, 3, 4]\nnums[-1]"), "4");
        assert_eq!(repr("nums = [1, 2, 3, 4]\nnums[::-2]"), "[4, 2]");
        assert_eq!(repr("d = {'k': [5, 6]}\nd['k'][1]"), "6");
        assert_eq!(repr("'hello'[1:3]"), "'el'");
    }

    #[test]
    fn test_subscript_read_is_logged() {
        let program = parse_source("nums = [1, 2, 3]\ni = 1\nx = nums[i]\ny = nums[:2]").unwrap();
        let mut analyzer = Analyzer::new();
        analyzer.execute_block(&program.body);
        let ops = analyzer.index_log.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].var_name, "nums");
        assert_eq!(ops[0].indices, vec![1]);
        assert_eq!(ops[1].indices, vec![0, 1]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            eval("missing").unwrap_err(),
            EvalError::UndefinedVariable { .. }
        ));
        assert!(matches!(
            eval("[1][5]").unwrap_err(),
            EvalError::IndexOutOfRange { .. }
        ));
        assert!(matches!(
            eval("{}['x']").unwrap_err(),
            EvalError::KeyNotFound { .. }
        ));
        assert!(matches!(
            eval("{[1]: 2}").unwrap_err(),
            EvalError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_method_calls() {
        assert_eq!(repr("'a b'.split()"), "['a', 'b']");
        assert_eq!(repr("nums = [3, 1, 2]\nnums.sort(reverse=True)\nnums"), "[3, 2, 1]");
    }
}
