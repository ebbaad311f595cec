//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime
//! values of the snippet language. Values are dynamically typed and tagged.
//!
//! # Value Types
//!
//! - [`Value::None`]: result of calls that return nothing, and the `None` literal
//! - [`Value::Int`] / [`Value::Float`] / [`Value::Bool`] / [`Value::Str`]: scalars
//! - [`Value::List`], [`Value::Set`], [`Value::Dict`]: mutable containers
//! - [`Value::Tuple`]: immutable, used for unpacking sources and enumerated pairs
//!
//! # Sharing
//!
//! Containers are reference-counted handles. Cloning a `Value` clones the
//! handle, so binding one list to two names aliases it and a mutation through
//! either name is visible through both. [`Value::deep_copy`] produces an
//! independent graph.

use super::store::{DictStore, SetStore};
use std::cell::RefCell;
use std::rc::Rc;

/// Nesting depth after which recursive walks stop descending
pub(crate) const MAX_NESTING: usize = 64;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Rc<RefCell<Vec<Value>>>),
    Set(Rc<RefCell<SetStore>>),
    Dict(Rc<RefCell<DictStore>>),
    Tuple(Rc<[Value]>),
}

/// Normalized identity of a hashable value.
///
/// Numbers that compare equal share one key, so `1`, `1.0` and `True` address
/// the same dict slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    Float(u64),
    Str(String),
    Tuple(Vec<HashKey>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items.into())
    }

    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn set(store: SetStore) -> Self {
        Value::Set(Rc::new(RefCell::new(store)))
    }

    pub fn dict(store: DictStore) -> Self {
        Value::Dict(Rc::new(RefCell::new(store)))
    }

    /// The language-level type name, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Tuple(_) => "tuple",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Set(set) => !set.borrow().is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
        }
    }

    /// Integer view of an index-like value (`bool` counts as an int)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Set(_) | Value::Dict(_))
    }

    /// Equality with the language's semantics: numbers compare by value across
    /// int/float/bool, containers compare element-wise.
    pub fn py_eq(&self, other: &Value) -> bool {
        self.eq_at_depth(other, 0)
    }

    fn eq_at_depth(&self, other: &Value, depth: usize) -> bool {
        if depth > MAX_NESTING {
            return false;
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b)
                    || seq_eq(&a.borrow(), &b.borrow(), depth)
            }
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b, depth),
            (Value::Set(a), Value::Set(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter_keyed().all(|(key, value)| {
                        b.get_by_key(key)
                            .is_some_and(|other| value.eq_at_depth(other, depth + 1))
                    })
            }
            (a, b) if a.is_number() && b.is_number() => numeric_eq(a, b),
            _ => false,
        }
    }

    /// Identity comparison (`is`): containers by handle, scalars by kind and value
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (a, b) => {
                std::mem::discriminant(a) == std::mem::discriminant(b)
                    && a.py_eq(b)
            }
        }
    }

    /// Hash identity of the value, or `None` when the value is unhashable
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::None => Some(HashKey::None),
            Value::Int(n) => Some(HashKey::Int(*n)),
            Value::Bool(b) => Some(HashKey::Int(i64::from(*b))),
            Value::Float(x) => Some(float_key(*x)),
            Value::Str(s) => Some(HashKey::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(Value::hash_key)
                .collect::<Option<Vec<_>>>()
                .map(HashKey::Tuple),
            Value::List(_) | Value::Set(_) | Value::Dict(_) => None,
        }
    }

    /// Snapshot of the items produced by iterating this value.
    ///
    /// Strings yield one-character strings and dicts yield their keys.
    /// Returns `None` for non-iterable values.
    pub fn iter_values(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.borrow().clone()),
            Value::Tuple(items) => Some(items.to_vec()),
            Value::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Set(set) => Some(set.borrow().values().cloned().collect()),
            Value::Dict(dict) => Some(dict.borrow().keys().cloned().collect()),
            Value::None
            | Value::Int(_)
            | Value::Float(_)
            | Value::Bool(_) => None,
        }
    }

    /// Recursively copy every container so the result shares no storage
    /// with `self`.
    pub fn deep_copy(&self) -> Value {
        self.copy_at_depth(0)
    }

    fn copy_at_depth(&self, depth: usize) -> Value {
        if depth > MAX_NESTING {
            return self.clone();
        }
        match self {
            Value::List(items) => Value::list(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.copy_at_depth(depth + 1))
                    .collect(),
            ),
            Value::Tuple(items) => Value::tuple(
                items.iter().map(|v| v.copy_at_depth(depth + 1)).collect(),
            ),
            Value::Set(set) => Value::set(set.borrow().clone()),
            Value::Dict(dict) => Value::dict(
                dict.borrow()
                    .map_values(|v| v.copy_at_depth(depth + 1)),
            ),
            scalar => scalar.clone(),
        }
    }
}

fn seq_eq(a: &[Value], b: &[Value], depth: usize) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| x.eq_at_depth(y, depth + 1))
}

fn numeric_eq(a: &Value, b: &Value) -> bool {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => x == y,
        _ => as_f64(a) == as_f64(b),
    }
}

/// Float view of a numeric value
pub(crate) fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

/// Integral floats hash like the equal integer
fn float_key(x: f64) -> HashKey {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        HashKey::Int(x as i64)
    } else {
        HashKey::Float(x.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_crosses_kinds() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&Value::str("1")));
    }

    #[test]
    fn test_hash_keys_normalize_numbers() {
        assert_eq!(Value::Int(1).hash_key(), Value::Float(1.0).hash_key());
        assert_eq!(Value::Bool(true).hash_key(), Value::Int(1).hash_key());
        assert_ne!(Value::Float(1.5).hash_key(), Value::Int(1).hash_key());
        assert!(Value::list(vec![]).hash_key().is_none());
        assert!(Value::tuple(vec![Value::list(vec![])]).hash_key().is_none());
    }

    #[test]
    fn test_clone_aliases_deep_copy_detaches() {
        let original = Value::list(vec![Value::Int(1)]);
        let alias = original.clone();
        let copy = original.deep_copy();

        if let Value::List(items) = &alias {
            items.borrow_mut().push(Value::Int(2));
        }

        assert!(original.py_eq(&alias));
        assert!(original.is_same(&alias));
        assert!(!copy.py_eq(&original));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::list(vec![Value::None]).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
    }

    #[test]
    fn test_identity_of_scalars_checks_kind() {
        assert!(Value::Int(3).is_same(&Value::Int(3)));
        assert!(!Value::Int(1).is_same(&Value::Bool(true)));
    }
}
