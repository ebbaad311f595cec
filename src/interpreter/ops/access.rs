//! Subscripts, slices and index resolution
//!
//! Two different things happen to a subscript:
//!
//! - **Value access** ([`Analyzer::subscript_value`], [`Analyzer::slice_value`]):
//!   the usual indexing with negative indices, key lookup and full
//!   `start:stop:step` slicing.
//! - **Index resolution** ([`Analyzer::resolve_indices`]): the list of integer
//!   positions a subscript denotes, recorded in the index operation log. It is
//!   computed from the evaluated [`SubscriptKey`] alone, never from the
//!   container, so a slice without an upper bound resolves to nothing.
//!
//! The subscript expression is evaluated exactly once into a [`SubscriptKey`];
//! the read or write and the logged positions both come from that key.

use crate::interpreter::constants::MAX_SEQUENCE_LEN;
use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use tracing::trace;

/// An evaluated subscript: a single key, or the bounds of a slice
#[derive(Debug, Clone)]
pub(crate) enum SubscriptKey {
    Key(Value),
    Slice {
        lower: Option<i64>,
        upper: Option<i64>,
        step: Option<i64>,
    },
}

impl Analyzer {
    /// `base[key]` for an already evaluated key
    pub(crate) fn read_subscript(
        base: &Value,
        key: &SubscriptKey,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match key {
            SubscriptKey::Key(index) => Self::subscript_value(base, index, location),
            SubscriptKey::Slice { lower, upper, step } => {
                Self::slice_value(base, *lower, *upper, *step, location)
            }
        }
    }

    /// `base[index]` for a non-slice index
    pub(crate) fn subscript_value(
        base: &Value,
        index: &Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match base {
            Value::List(items) => {
                let items = items.borrow();
                let pos = Self::sequence_position(index, items.len(), "list", location)?;
                Ok(items[pos].clone())
            }
            Value::Tuple(items) => {
                let pos = Self::sequence_position(index, items.len(), "tuple", location)?;
                Ok(items[pos].clone())
            }
            Value::Str(text) => {
                let length = text.chars().count();
                let pos = Self::sequence_position(index, length, "string", location)?;
                Ok(text
                    .chars()
                    .nth(pos)
                    .map(|c| Value::Str(c.to_string()))
                    .unwrap_or_default())
            }
            Value::Dict(dict) => dict
                .borrow()
                .get(index)
                .map_err(|e| EvalError::unhashable(e, location))?
                .cloned()
                .ok_or_else(|| EvalError::KeyNotFound {
                    key: index.repr(),
                    location,
                }),
            other => Err(EvalError::type_mismatch(
                format!("'{}' object is not subscriptable", other.type_name()),
                location,
            )),
        }
    }

    /// Validate `index` against a sequence of `length` items
    fn sequence_position(
        index: &Value,
        length: usize,
        kind: &str,
        location: SourceLocation,
    ) -> Result<usize, EvalError> {
        let raw = index.as_int().ok_or_else(|| {
            EvalError::type_mismatch(
                format!("{kind} indices must be integers, not {}", index.type_name()),
                location,
            )
        })?;
        normalize_index(raw, length).ok_or_else(|| EvalError::IndexOutOfRange {
            message: format!("{kind} index out of range"),
            location,
        })
    }

    /// `base[lower:upper:step]`; omitted bounds are `None`
    pub(crate) fn slice_value(
        base: &Value,
        lower: Option<i64>,
        upper: Option<i64>,
        step: Option<i64>,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(EvalError::value_error("slice step cannot be zero", location));
        }

        match base {
            Value::List(items) => {
                let items = items.borrow();
                let picked = slice_positions(items.len(), lower, upper, step)
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect();
                Ok(Value::list(picked))
            }
            Value::Tuple(items) => Ok(Value::tuple(
                slice_positions(items.len(), lower, upper, step)
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect(),
            )),
            Value::Str(text) => {
                let chars: Vec<char> = text.chars().collect();
                Ok(Value::Str(
                    slice_positions(chars.len(), lower, upper, step)
                        .into_iter()
                        .map(|i| chars[i])
                        .collect(),
                ))
            }
            other => Err(EvalError::type_mismatch(
                format!("'{}' object is not subscriptable", other.type_name()),
                location,
            )),
        }
    }

    /// `container[key] = value` for a single key. Lists need an in-range
    /// integer index, dicts insert or overwrite.
    pub(crate) fn store_subscript(
        container: &Value,
        key: &Value,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        match container {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let pos = Self::sequence_position(key, items.len(), "list assignment", location)?;
                items[pos] = value;
                Ok(())
            }
            Value::Dict(dict) => dict
                .borrow_mut()
                .insert(key.clone(), value)
                .map_err(|e| EvalError::unhashable(e, location)),
            other => Err(EvalError::type_mismatch(
                format!(
                    "'{}' object does not support item assignment",
                    other.type_name()
                ),
                location,
            )),
        }
    }

    /// The integer positions an evaluated subscript denotes.
    ///
    /// - an integer key `a[2]` → `[2]`
    /// - slice with an upper bound `a[l:u]` → `[l, …, u-1]`, `l` defaulting to 0
    /// - slice without an upper bound → `[]`
    /// - any other key → `[]`
    pub(crate) fn resolve_indices(key: &SubscriptKey) -> Vec<i64> {
        match key {
            SubscriptKey::Key(Value::Int(n)) => vec![*n],
            SubscriptKey::Key(_) | SubscriptKey::Slice { upper: None, .. } => Vec::new(),
            SubscriptKey::Slice {
                lower,
                upper: Some(upper),
                ..
            } => {
                let lower = lower.unwrap_or(0);
                let span = (*upper as i128 - lower as i128).max(0);
                if span > MAX_SEQUENCE_LEN as i128 {
                    trace!(lower, upper, "slice span too large to resolve");
                    return Vec::new();
                }
                (lower..*upper).collect()
            }
        }
    }
}

/// Map a possibly negative index into `0..length`
pub(crate) fn normalize_index(index: i64, length: usize) -> Option<usize> {
    let length = i64::try_from(length).ok()?;
    let adjusted = if index < 0 { index + length } else { index };
    if (0..length).contains(&adjusted) {
        usize::try_from(adjusted).ok()
    } else {
        None
    }
}

/// Positions selected by a slice over `length` items (`step` is non-zero)
pub(crate) fn slice_positions(
    length: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: i64,
) -> Vec<usize> {
    let len = length as i64;
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };

    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |b| clamp(b, 0, len)),
            upper.map_or(len, |b| clamp(b, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |b| clamp(b, -1, len - 1)),
            upper.map_or(-1, |b| clamp(b, -1, len - 1)),
        )
    };

    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        positions.push(i as usize);
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[i64]) -> Value {
        Value::list(values.iter().map(|&n| Value::Int(n)).collect())
    }

    fn slice(base: &Value, lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> String {
        Analyzer::slice_value(base, lower, upper, step, SourceLocation::default())
            .unwrap()
            .repr()
    }

    #[test]
    fn test_negative_index() {
        let list = nums(&[1, 2, 3]);
        let value = Analyzer::subscript_value(&list, &Value::Int(-1), SourceLocation::default());
        assert_eq!(value.unwrap().repr(), "3");
    }

    #[test]
    fn test_index_out_of_range() {
        let list = nums(&[1]);
        let err = Analyzer::subscript_value(&list, &Value::Int(5), SourceLocation::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { .. }));
    }

    #[test]
    fn test_missing_key() {
        let dict = Value::dict(Default::default());
        let err = Analyzer::subscript_value(&dict, &Value::str("k"), SourceLocation::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::KeyNotFound { ref key, .. } if key == "'k'"));
    }

    #[test]
    fn test_slices() {
        let list = nums(&[0, 1, 2, 3, 4]);
        assert_eq!(slice(&list, Some(1), None, None), "[1, 2, 3, 4]");
        assert_eq!(slice(&list, None, Some(-2), None), "[0, 1, 2]");
        assert_eq!(slice(&list, None, None, Some(-1)), "[4, 3, 2, 1, 0]");
        assert_eq!(slice(&list, Some(3), Some(0), Some(-2)), "[3, 1]");
        assert_eq!(slice(&list, Some(10), None, None), "[]");
        assert_eq!(slice(&Value::str("hello"), None, None, Some(2)), "'hlo'");
    }

    #[test]
    fn test_slices_with_extreme_steps() {
        let list = nums(&[0, 1, 2, 3, 4]);
        assert_eq!(slice(&list, Some(1), None, Some(i64::MAX)), "[1]");
        assert_eq!(slice(&list, None, None, Some(i64::MIN)), "[4]");
        assert_eq!(slice(&list, Some(-1), Some(i64::MIN), Some(i64::MIN)), "[4]");
        assert_eq!(slice_positions(3, Some(i64::MAX), None, i64::MAX), Vec::<usize>::new());
    }

    #[test]
    fn test_resolve_indices_from_evaluated_key() {
        let key = |value| SubscriptKey::Key(value);
        let range = |lower, upper| SubscriptKey::Slice {
            lower,
            upper,
            step: None,
        };

        assert_eq!(Analyzer::resolve_indices(&key(Value::Int(-1))), vec![-1]);
        assert!(Analyzer::resolve_indices(&key(Value::str("k"))).is_empty());
        assert_eq!(Analyzer::resolve_indices(&range(None, Some(3))), vec![0, 1, 2]);
        assert_eq!(Analyzer::resolve_indices(&range(Some(2), Some(4))), vec![2, 3]);
        assert!(Analyzer::resolve_indices(&range(Some(1), None)).is_empty());
        assert!(Analyzer::resolve_indices(&range(Some(0), Some(i64::MAX))).is_empty());
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = Analyzer::slice_value(&nums(&[1]), None, None, Some(0), SourceLocation::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::ValueError { .. }));
    }

    #[test]
    fn test_store_into_list_and_dict() {
        let list = nums(&[1, 2]);
        Analyzer::store_subscript(&list, &Value::Int(-1), Value::Int(9), SourceLocation::default())
            .unwrap();
        assert_eq!(list.repr(), "[1, 9]");

        let dict = Value::dict(Default::default());
        Analyzer::store_subscript(&dict, &Value::str("a"), Value::Int(1), SourceLocation::default())
            .unwrap();
        assert_eq!(dict.repr(), "{'a': 1}");
    }
}
