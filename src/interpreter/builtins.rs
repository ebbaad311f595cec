//! Built-in function implementations
//!
//! Free functions are dispatched by name in [`Analyzer::call_builtin`] after
//! every argument has been evaluated left to right. Method calls go through
//! the same [`CallArgs`] bundle (see `methods.rs`).
//!
//! # Supported Built-ins
//!
//! | Function | Forms |
//! |----------|-------|
//! | `print` | `print(*values, sep=' ', end='\n')` |
//! | `len` | `len(obj)` |
//! | `max`, `min` | `max(iterable, default=…)`, `max(a, b, …)` |
//! | `sum` | `sum(iterable, start=0)` |
//! | `abs`, `round` | `abs(x)`, `round(x, ndigits=None)` |
//! | `int`, `float`, `str`, `bool` | conversions, no argument gives the zero value |
//! | `list`, `set` | materialize an iterable |
//! | `range` | `range(stop)`, `range(start, stop[, step])` as a list |
//! | `enumerate` | `enumerate(iterable, start=0)` as a list of pairs |
//! | `sorted`, `reversed` | `sorted(iterable, reverse=False)`, `reversed(seq)` |
//!
//! # Implementation Notes
//!
//! - `range` materializes at most [`MAX_SEQUENCE_LEN`] elements
//! - `round` rounds half to even
//! - `print` is the only built-in with a side effect: it appends to the active
//!   output buffer and yields `None`

use crate::interpreter::constants::MAX_SEQUENCE_LEN;
use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::{iterate, Number};
use crate::memory::store::SetStore;
use crate::memory::value::Value;
use crate::parser::ast::{BinOp, SourceLocation};
use std::cmp::Ordering;

/// Evaluated arguments of one call
#[derive(Debug, Clone)]
pub(crate) struct CallArgs {
    /// Callee name used in error messages (`len`, `append`, …)
    pub(crate) name: String,
    pub(crate) positional: Vec<Value>,
    pub(crate) keywords: Vec<(String, Value)>,
    pub(crate) location: SourceLocation,
}

impl CallArgs {
    pub(crate) fn new(name: &str, positional: Vec<Value>, location: SourceLocation) -> Self {
        CallArgs {
            name: name.to_string(),
            positional,
            keywords: Vec::new(),
            location,
        }
    }

    /// Remove and return the keyword argument `name`
    pub(crate) fn take_keyword(&mut self, name: &str) -> Option<Value> {
        let pos = self.keywords.iter().position(|(key, _)| key == name)?;
        Some(self.keywords.remove(pos).1)
    }

    /// Remove the keyword `name`, or the positional argument at `index` when
    /// the keyword is absent
    pub(crate) fn take_argument(&mut self, index: usize, name: &str) -> Option<Value> {
        match self.take_keyword(name) {
            Some(value) => Some(value),
            None if index < self.positional.len() => Some(self.positional.remove(index)),
            None => None,
        }
    }

    /// Check the positional count and reject any keyword nobody consumed
    pub(crate) fn arity(&self, min: usize, max: usize) -> Result<(), EvalError> {
        if let Some((key, _)) = self.keywords.first() {
            return Err(EvalError::type_mismatch(
                format!("{}() got an unexpected keyword argument '{}'", self.name, key),
                self.location,
            ));
        }

        let given = self.positional.len();
        if (min..=max).contains(&given) {
            return Ok(());
        }
        let expected = match (min, max) {
            (min, max) if min == max => format!("exactly {min}"),
            (0, max) => format!("at most {max}"),
            (min, usize::MAX) => format!("at least {min}"),
            (min, max) => format!("from {min} to {max}"),
        };
        let plural = if min == 1 && max == 1 { "" } else { "s" };
        Err(EvalError::type_mismatch(
            format!(
                "{}() takes {} argument{} ({} given)",
                self.name, expected, plural, given
            ),
            self.location,
        ))
    }

    /// Positional arguments after an exact-count check
    pub(crate) fn exact<const N: usize>(self) -> Result<[Value; N], EvalError> {
        self.arity(N, N)?;
        let location = self.location;
        <[Value; N]>::try_from(self.positional)
            .map_err(|_| EvalError::type_mismatch("wrong number of arguments", location))
    }
}

impl Analyzer {
    pub(crate) fn call_builtin(&mut self, args: CallArgs) -> Result<Value, EvalError> {
        match args.name.as_str() {
            "print" => self.builtin_print(args),
            "len" => builtin_len(args),
            "max" => builtin_extreme(args, Ordering::Greater),
            "min" => builtin_extreme(args, Ordering::Less),
            "sum" => builtin_sum(args),
            "abs" => builtin_abs(args),
            "int" => builtin_int(args),
            "float" => builtin_float(args),
            "str" => builtin_str(args),
            "bool" => builtin_bool(args),
            "round" => builtin_round(args),
            "list" => builtin_list(args),
            "set" => builtin_set(args),
            "range" => builtin_range(args),
            "enumerate" => builtin_enumerate(args),
            "sorted" => builtin_sorted(args),
            "reversed" => builtin_reversed(args),
            _ => Err(EvalError::UnsupportedFunction {
                name: args.name,
                location: args.location,
            }),
        }
    }

    fn builtin_print(&mut self, mut args: CallArgs) -> Result<Value, EvalError> {
        let sep = text_option(args.take_keyword("sep"), " ", "sep", args.location)?;
        let end = text_option(args.take_keyword("end"), "\n", "end", args.location)?;
        args.arity(0, usize::MAX)?;

        let line = args
            .positional
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(&sep);
        self.output.write(&line);
        self.output.write(&end);
        Ok(Value::None)
    }
}

/// `sep=`/`end=` accept a string or `None`
fn text_option(
    value: Option<Value>,
    default: &str,
    name: &str,
    location: SourceLocation,
) -> Result<String, EvalError> {
    match value {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(text)) => Ok(text),
        Some(other) => Err(EvalError::type_mismatch(
            format!("{name} must be None or a string, not {}", other.type_name()),
            location,
        )),
    }
}

fn builtin_len(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let [value] = args.exact()?;
    let length = match &value {
        Value::Str(text) => text.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Set(set) => set.borrow().len(),
        Value::Dict(dict) => dict.borrow().len(),
        other => {
            return Err(EvalError::type_mismatch(
                format!("object of type '{}' has no len()", other.type_name()),
                location,
            ))
        }
    };
    i64::try_from(length)
        .map(Value::Int)
        .map_err(|_| EvalError::overflow(location))
}

/// `max` keeps the first of equal maxima, `min` the first of equal minima
fn builtin_extreme(mut args: CallArgs, wanted: Ordering) -> Result<Value, EvalError> {
    let location = args.location;
    let default = args.take_keyword("default");
    args.arity(1, usize::MAX)?;

    let candidates = if args.positional.len() == 1 {
        iterate(&args.positional[0], location)?
    } else if default.is_some() {
        return Err(EvalError::type_mismatch(
            format!(
                "Cannot specify a default for {}() with multiple positional arguments",
                args.name
            ),
            location,
        ));
    } else {
        args.positional
    };

    let symbol = if wanted == Ordering::Greater { ">" } else { "<" };
    let mut items = candidates.into_iter();
    let Some(mut best) = items.next() else {
        return default.ok_or_else(|| {
            EvalError::value_error(format!("{}() arg is an empty sequence", args.name), location)
        });
    };
    for item in items {
        if Analyzer::order_values(&item, &best, symbol, location)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_sum(mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let start = args.take_argument(1, "start").unwrap_or(Value::Int(0));
    let [iterable] = args.exact()?;
    if matches!(start, Value::Str(_)) {
        return Err(EvalError::type_mismatch(
            "sum() can't sum strings [use ''.join(seq) instead]",
            location,
        ));
    }

    iterate(&iterable, location)?
        .into_iter()
        .try_fold(start, |total, item| {
            Analyzer::evaluate_binary_op(BinOp::Add, &total, &item, location)
        })
}

fn builtin_abs(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let [value] = args.exact()?;
    match Number::of(&value) {
        Some(Number::Int(n)) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow(location)),
        Some(Number::Float(x)) => Ok(Value::Float(x.abs())),
        None => Err(EvalError::type_mismatch(
            format!("bad operand type for abs(): '{}'", value.type_name()),
            location,
        )),
    }
}

fn builtin_int(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    args.arity(0, 1)?;
    let Some(value) = args.positional.into_iter().next() else {
        return Ok(Value::Int(0));
    };
    match &value {
        Value::Int(_) => Ok(value),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => float_to_int(*x, location).map(Value::Int),
        Value::Str(text) => {
            let digits: String = text.trim().chars().filter(|&c| c != '_').collect();
            digits.parse::<i64>().map(Value::Int).map_err(|_| {
                EvalError::value_error(
                    format!("invalid literal for int() with base 10: {}", value.repr()),
                    location,
                )
            })
        }
        other => Err(EvalError::type_mismatch(
            format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ),
            location,
        )),
    }
}

/// Truncate toward zero
fn float_to_int(x: f64, location: SourceLocation) -> Result<i64, EvalError> {
    if x.is_nan() {
        return Err(EvalError::value_error("cannot convert float NaN to integer", location));
    }
    if x.is_infinite() {
        return Err(EvalError::overflow(location));
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(EvalError::overflow(location));
    }
    Ok(truncated as i64)
}

fn builtin_float(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    args.arity(0, 1)?;
    let Some(value) = args.positional.into_iter().next() else {
        return Ok(Value::Float(0.0));
    };
    if let Some(number) = Number::of(&value) {
        return Ok(Value::Float(number.to_f64()));
    }
    match &value {
        Value::Str(text) => text.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvalError::value_error(
                format!("could not convert string to float: {}", value.repr()),
                location,
            )
        }),
        other => Err(EvalError::type_mismatch(
            format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ),
            location,
        )),
    }
}

fn builtin_str(args: CallArgs) -> Result<Value, EvalError> {
    args.arity(0, 1)?;
    Ok(match args.positional.first() {
        Some(value) => Value::Str(value.to_string()),
        None => Value::str(""),
    })
}

fn builtin_bool(args: CallArgs) -> Result<Value, EvalError> {
    args.arity(0, 1)?;
    Ok(Value::Bool(
        args.positional.first().is_some_and(Value::is_truthy),
    ))
}

fn builtin_round(mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let ndigits = args.take_argument(1, "ndigits").unwrap_or(Value::None);
    let [value] = args.exact()?;

    let ndigits = match ndigits {
        Value::None => None,
        other => Some(other.as_int().ok_or_else(|| {
            EvalError::type_mismatch(
                format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                ),
                location,
            )
        })?),
    };

    match (Number::of(&value), ndigits) {
        (Some(Number::Int(n)), None) => Ok(Value::Int(n)),
        (Some(Number::Int(n)), Some(digits)) if digits >= 0 => Ok(Value::Int(n)),
        (Some(Number::Int(n)), Some(digits)) => {
            let scale = 10f64.powi(i32::try_from(digits.saturating_neg()).unwrap_or(i32::MAX));
            let rounded = ((n as f64) / scale).round_ties_even() * scale;
            float_to_int(rounded, location).map(Value::Int)
        }
        (Some(Number::Float(x)), None) => float_to_int(x.round_ties_even(), location).map(Value::Int),
        (Some(Number::Float(x)), Some(digits)) => {
            let digits = i32::try_from(digits.clamp(-308, 308)).unwrap_or(0);
            let scale = 10f64.powi(digits);
            let rounded = (x * scale).round_ties_even() / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { x }))
        }
        (None, _) => Err(EvalError::type_mismatch(
            format!(
                "type {} doesn't define __round__ method",
                value.type_name()
            ),
            location,
        )),
    }
}

fn builtin_list(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    args.arity(0, 1)?;
    match args.positional.first() {
        Some(value) => Ok(Value::list(iterate(value, location)?)),
        None => Ok(Value::list(Vec::new())),
    }
}

fn builtin_set(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    args.arity(0, 1)?;
    let items = match args.positional.first() {
        Some(value) => iterate(value, location)?,
        None => Vec::new(),
    };
    SetStore::from_values(items)
        .map(Value::set)
        .map_err(|e| EvalError::unhashable(e, location))
}

fn builtin_range(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    args.arity(1, 3)?;
    let bounds = args
        .positional
        .iter()
        .map(|value| {
            value.as_int().ok_or_else(|| {
                EvalError::type_mismatch(
                    format!(
                        "'{}' object cannot be interpreted as an integer",
                        value.type_name()
                    ),
                    location,
                )
            })
        })
        .collect::<Result<Vec<i64>, _>>()?;

    let (start, stop, step) = match bounds[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => return Err(EvalError::type_mismatch("range expected 1 to 3 arguments", location)),
    };
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero", location));
    }

    let length = range_length(start, stop, step);
    if length > MAX_SEQUENCE_LEN as u128 {
        return Err(EvalError::RangeTooLarge {
            length,
            limit: MAX_SEQUENCE_LEN,
            location,
        });
    }
    let items = (0..length as i128)
        .map(|i| Value::Int((start as i128 + i * step as i128) as i64))
        .collect();
    Ok(Value::list(items))
}

/// Number of elements in `range(start, stop, step)`, `step != 0`
fn range_length(start: i64, stop: i64, step: i64) -> u128 {
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let span = if step > 0 { stop - start } else { start - stop };
    let step = step.abs();
    if span <= 0 {
        0
    } else {
        ((span + step - 1) / step) as u128
    }
}

fn builtin_enumerate(mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let start = args.take_argument(1, "start").unwrap_or(Value::Int(0));
    let [iterable] = args.exact()?;
    let start = start.as_int().ok_or_else(|| {
        EvalError::type_mismatch(
            format!(
                "'{}' object cannot be interpreted as an integer",
                start.type_name()
            ),
            location,
        )
    })?;

    let pairs = iterate(&iterable, location)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let index = i64::try_from(i)
                .ok()
                .and_then(|i| i.checked_add(start))
                .ok_or_else(|| EvalError::overflow(location))?;
            Ok(Value::tuple(vec![Value::Int(index), item]))
        })
        .collect::<Result<Vec<_>, EvalError>>()?;
    Ok(Value::list(pairs))
}

fn builtin_sorted(mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let reverse = args.take_keyword("reverse").is_some_and(|v| v.is_truthy());
    let [iterable] = args.exact()?;
    let mut items = iterate(&iterable, location)?;
    Analyzer::sort_values(&mut items, reverse, location)?;
    Ok(Value::list(items))
}

fn builtin_reversed(args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let [sequence] = args.exact()?;
    if matches!(sequence, Value::Set(_)) {
        return Err(EvalError::type_mismatch(
            "'set' object is not reversible",
            location,
        ));
    }
    let mut items = iterate(&sequence, location)?;
    items.reverse();
    Ok(Value::list(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, positional: Vec<Value>) -> Result<Value, EvalError> {
        let mut analyzer = Analyzer::new();
        analyzer.call_builtin(CallArgs::new(name, positional, SourceLocation::new(1, 1)))
    }

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|&n| Value::Int(n)).collect())
    }

    #[test]
    fn test_len_max_min_sum() {
        let nums = ints(&[1, 5, 3, 9, 2]);
        assert_eq!(call("len", vec![nums.clone()]).unwrap().repr(), "5");
        assert_eq!(call("max", vec![nums.clone()]).unwrap().repr(), "9");
        assert_eq!(call("min", vec![nums.clone()]).unwrap().repr(), "1");
        assert_eq!(call("sum", vec![nums]).unwrap().repr(), "20");
        assert_eq!(
            call("max", vec![Value::Int(3), Value::Float(3.5)]).unwrap().repr(),
            "3.5"
        );
    }

    #[test]
    fn test_empty_max_fails() {
        let err = call("max", vec![ints(&[])]).unwrap_err();
        assert!(matches!(err, EvalError::ValueError { .. }));
    }

    #[test]
    fn test_max_default_keyword() {
        let mut args = CallArgs::new("max", vec![ints(&[])], SourceLocation::new(1, 1));
        args.keywords.push(("default".to_string(), Value::Int(-1)));
        let mut analyzer = Analyzer::new();
        assert_eq!(analyzer.call_builtin(args).unwrap().repr(), "-1");
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(call("range", vec![Value::Int(3)]).unwrap().repr(), "[0, 1, 2]");
        assert_eq!(
            call("range", vec![Value::Int(5), Value::Int(0), Value::Int(-2)])
                .unwrap()
                .repr(),
            "[5, 3, 1]"
        );
        assert_eq!(call("range", vec![Value::Int(3), Value::Int(1)]).unwrap().repr(), "[]");
    }

    #[test]
    fn test_range_limits() {
        let err = call("range", vec![Value::Int(1_000_000)]).unwrap_err();
        assert!(matches!(err, EvalError::RangeTooLarge { length: 1_000_000, .. }));

        let err = call("range", vec![Value::Int(0), Value::Int(5), Value::Int(0)]).unwrap_err();
        assert!(matches!(err, EvalError::ValueError { .. }));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", vec![Value::str(" 42 ")]).unwrap().repr(), "42");
        assert_eq!(call("int", vec![Value::Float(-2.7)]).unwrap().repr(), "-2");
        assert!(call("int", vec![Value::str("abc")]).is_err());
        assert_eq!(call("float", vec![Value::Int(2)]).unwrap().repr(), "2.0");
        assert_eq!(call("str", vec![Value::Float(0.5)]).unwrap().repr(), "'0.5'");
        assert_eq!(call("bool", vec![ints(&[])]).unwrap().repr(), "False");
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(call("round", vec![Value::Float(2.5)]).unwrap().repr(), "2");
        assert_eq!(call("round", vec![Value::Float(3.5)]).unwrap().repr(), "4");
        assert_eq!(
            call("round", vec![Value::Float(2.25), Value::Int(1)]).unwrap().repr(),
            "2.2"
        );
    }

    #[test]
    fn test_enumerate_sorted_reversed() {
        let letters = Value::list(vec![Value::str("b"), Value::str("a")]);
        assert_eq!(
            call("enumerate", vec![letters.clone(), Value::Int(1)]).unwrap().repr(),
            "[(1, 'b'), (2, 'a')]"
        );
        assert_eq!(call("sorted", vec![letters.clone()]).unwrap().repr(), "['a', 'b']");
        assert_eq!(call("reversed", vec![letters]).unwrap().repr(), "['a', 'b']");
    }

    #[test]
    fn test_print_joins_with_sep() {
        let mut analyzer = Analyzer::new();
        let mut args = CallArgs::new(
            "print",
            vec![Value::Int(1), Value::str("a")],
            SourceLocation::new(1, 1),
        );
        args.keywords.push(("sep".to_string(), Value::str("-")));
        assert!(matches!(analyzer.call_builtin(args).unwrap(), Value::None));
        assert_eq!(analyzer.output.lines(), vec!["1-a"]);
    }

    #[test]
    fn test_unknown_function_and_bad_arity() {
        assert!(matches!(
            call("open", vec![]).unwrap_err(),
            EvalError::UnsupportedFunction { .. }
        ));
        let err = call("len", vec![]).unwrap_err();
        assert!(err.to_string().starts_with("len() takes exactly 1 argument (0 given)"));
    }
}
