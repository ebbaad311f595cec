//! Method dispatch by receiver kind and method name
//!
//! Mutating methods change the shared storage behind the receiver, so every
//! name bound to the same container observes the change. Arguments are always
//! snapshotted before the receiver is borrowed mutably: `nums.extend(nums)`
//! reads the list before it grows.

use crate::interpreter::builtins::CallArgs;
use crate::interpreter::engine::Analyzer;
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::access::normalize_index;
use crate::interpreter::ops::iterate;
use crate::memory::store::{DictStore, SetStore};
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use std::cell::RefCell;
use std::rc::Rc;

impl Analyzer {
    /// Call `receiver.<args.name>(…)`
    pub(crate) fn call_method(receiver: &Value, args: CallArgs) -> Result<Value, EvalError> {
        match receiver {
            Value::List(items) => list_method(items, args),
            Value::Str(text) => str_method(text, args),
            Value::Dict(dict) => dict_method(dict, args),
            Value::Set(set) => set_method(set, args),
            other => Err(unsupported(other, args)),
        }
    }
}

fn unsupported(receiver: &Value, args: CallArgs) -> EvalError {
    EvalError::UnsupportedMethod {
        receiver: receiver.type_name().to_string(),
        method: args.name,
        location: args.location,
    }
}

fn expect_int(value: &Value, location: SourceLocation) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::type_mismatch(
            format!(
                "'{}' object cannot be interpreted as an integer",
                value.type_name()
            ),
            location,
        )
    })
}

fn expect_str<'a>(value: &'a Value, what: &str, location: SourceLocation) -> Result<&'a str, EvalError> {
    match value {
        Value::Str(text) => Ok(text),
        other => Err(EvalError::type_mismatch(
            format!("{what} must be str, not {}", other.type_name()),
            location,
        )),
    }
}

fn int_value(n: usize, location: SourceLocation) -> Result<Value, EvalError> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| EvalError::overflow(location))
}

// ---------------------------------------------------------------- list

fn list_method(items: &Rc<RefCell<Vec<Value>>>, mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    match args.name.as_str() {
        "append" => {
            let [item] = args.exact()?;
            items.borrow_mut().push(item);
            Ok(Value::None)
        }
        "pop" => {
            args.arity(0, 1)?;
            let index = match args.positional.first() {
                Some(value) => expect_int(value, location)?,
                None => -1,
            };
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(EvalError::IndexOutOfRange {
                    message: "pop from empty list".to_string(),
                    location,
                });
            }
            let pos = normalize_index(index, items.len()).ok_or_else(|| {
                EvalError::IndexOutOfRange {
                    message: "pop index out of range".to_string(),
                    location,
                }
            })?;
            Ok(items.remove(pos))
        }
        "remove" => {
            let [item] = args.exact()?;
            let pos = items.borrow().iter().position(|v| v.py_eq(&item));
            match pos {
                Some(pos) => {
                    items.borrow_mut().remove(pos);
                    Ok(Value::None)
                }
                None => Err(EvalError::value_error("list.remove(x): x not in list", location)),
            }
        }
        "insert" => {
            let [index, item] = args.exact()?;
            let index = expect_int(&index, location)?;
            let mut items = items.borrow_mut();
            let len = i64::try_from(items.len()).map_err(|_| EvalError::overflow(location))?;
            let pos = if index < 0 { (index + len).max(0) } else { index.min(len) };
            items.insert(pos as usize, item);
            Ok(Value::None)
        }
        "reverse" => {
            args.arity(0, 0)?;
            items.borrow_mut().reverse();
            Ok(Value::None)
        }
        "sort" => {
            let reverse = args.take_keyword("reverse").is_some_and(|v| v.is_truthy());
            args.arity(0, 0)?;
            let mut sorted = items.borrow().clone();
            Analyzer::sort_values(&mut sorted, reverse, location)?;
            *items.borrow_mut() = sorted;
            Ok(Value::None)
        }
        "index" => {
            let [item] = args.exact()?;
            let pos = items.borrow().iter().position(|v| v.py_eq(&item));
            match pos {
                Some(pos) => int_value(pos, location),
                None => Err(EvalError::value_error(
                    format!("{} is not in list", item.repr()),
                    location,
                )),
            }
        }
        "count" => {
            let [item] = args.exact()?;
            let count = items.borrow().iter().filter(|v| v.py_eq(&item)).count();
            int_value(count, location)
        }
        "extend" => {
            let [iterable] = args.exact()?;
            let extra = iterate(&iterable, location)?;
            items.borrow_mut().extend(extra);
            Ok(Value::None)
        }
        "copy" => {
            args.arity(0, 0)?;
            Ok(Value::list(items.borrow().clone()))
        }
        "clear" => {
            args.arity(0, 0)?;
            items.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(unsupported(&Value::List(Rc::clone(items)), args)),
    }
}

// ---------------------------------------------------------------- str

fn str_method(text: &str, mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    match args.name.as_str() {
        "split" => {
            let maxsplit = args.take_argument(1, "maxsplit").unwrap_or(Value::Int(-1));
            let sep = args.take_argument(0, "sep").unwrap_or(Value::None);
            args.arity(0, 0)?;
            let maxsplit = usize::try_from(expect_int(&maxsplit, location)?).ok();
            let parts = match &sep {
                Value::None => split_whitespace(text, maxsplit),
                other => {
                    let sep = expect_str(other, "separator", location)?;
                    if sep.is_empty() {
                        return Err(EvalError::value_error("empty separator", location));
                    }
                    match maxsplit {
                        Some(n) => text.splitn(n.saturating_add(1), sep).map(str::to_string).collect(),
                        None => text.split(sep).map(str::to_string).collect(),
                    }
                }
            };
            Ok(Value::list(parts.into_iter().map(Value::Str).collect()))
        }
        "join" => {
            let [iterable] = args.exact()?;
            let pieces = iterate(&iterable, location)?
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Str(piece) => Ok(piece),
                    other => Err(EvalError::type_mismatch(
                        format!(
                            "sequence item {i}: expected str instance, {} found",
                            other.type_name()
                        ),
                        location,
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(pieces.join(text)))
        }
        "replace" => {
            let count = args.take_argument(2, "count").unwrap_or(Value::Int(-1));
            let [old, new] = args.exact()?;
            let old = expect_str(&old, "replace() argument 1", location)?;
            let new = expect_str(&new, "replace() argument 2", location)?;
            Ok(Value::Str(match usize::try_from(expect_int(&count, location)?) {
                Ok(count) => text.replacen(old, new, count),
                Err(_) => text.replace(old, new),
            }))
        }
        "strip" | "lstrip" | "rstrip" => {
            args.arity(0, 1)?;
            let chars: Option<Vec<char>> = match args.positional.first() {
                None | Some(Value::None) => None,
                Some(other) => Some(expect_str(other, "strip arg", location)?.chars().collect()),
            };
            let matches = |c: char| match &chars {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            Ok(Value::str(match args.name.as_str() {
                "lstrip" => text.trim_start_matches(matches),
                "rstrip" => text.trim_end_matches(matches),
                _ => text.trim_matches(matches),
            }))
        }
        "lower" => {
            args.arity(0, 0)?;
            Ok(Value::Str(text.to_lowercase()))
        }
        "upper" => {
            args.arity(0, 0)?;
            Ok(Value::Str(text.to_uppercase()))
        }
        "title" => {
            args.arity(0, 0)?;
            Ok(Value::Str(title_case(text)))
        }
        "isdigit" => {
            args.arity(0, 0)?;
            Ok(Value::Bool(
                !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()),
            ))
        }
        "startswith" | "endswith" => {
            let prefix = args.name == "startswith";
            let what = format!("{} arg", args.name);
            let [affix] = args.exact()?;
            let candidates = match &affix {
                Value::Tuple(items) => items.to_vec(),
                other => vec![other.clone()],
            };
            let mut found = false;
            for candidate in &candidates {
                let candidate = expect_str(candidate, &what, location)?;
                found |= if prefix {
                    text.starts_with(candidate)
                } else {
                    text.ends_with(candidate)
                };
            }
            Ok(Value::Bool(found))
        }
        "find" => {
            let [needle] = args.exact()?;
            let needle = expect_str(&needle, "find() argument", location)?;
            match text.find(needle) {
                Some(byte) => int_value(text[..byte].chars().count(), location),
                None => Ok(Value::Int(-1)),
            }
        }
        "count" => {
            let [needle] = args.exact()?;
            let needle = expect_str(&needle, "count() argument", location)?;
            int_value(text.matches(needle).count(), location)
        }
        _ => Err(unsupported(&Value::str(text), args)),
    }
}

/// Split on runs of whitespace, at most `maxsplit` times
fn split_whitespace(text: &str, maxsplit: Option<usize>) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if maxsplit.is_some_and(|max| parts.len() >= max) {
            parts.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(rest.to_string());
                break;
            }
        }
    }
    parts
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            result.push(c);
            previous_alpha = false;
        }
    }
    result
}

// ---------------------------------------------------------------- dict

fn dict_method(dict: &Rc<RefCell<DictStore>>, mut args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let unhashable = |e| EvalError::unhashable(e, location);
    match args.name.as_str() {
        "get" => {
            args.arity(1, 2)?;
            let mut positional = args.positional.into_iter();
            let key = positional.next().unwrap_or_default();
            let default = positional.next().unwrap_or_default();
            let found = dict.borrow().get(&key).map_err(unhashable)?.cloned();
            Ok(found.unwrap_or(default))
        }
        "keys" => {
            args.arity(0, 0)?;
            Ok(Value::list(dict.borrow().keys().cloned().collect()))
        }
        "values" => {
            args.arity(0, 0)?;
            Ok(Value::list(dict.borrow().values().cloned().collect()))
        }
        "items" => {
            args.arity(0, 0)?;
            let pairs = dict
                .borrow()
                .iter()
                .map(|(key, value)| Value::tuple(vec![key.clone(), value.clone()]))
                .collect();
            Ok(Value::list(pairs))
        }
        "pop" => {
            args.arity(1, 2)?;
            let mut positional = args.positional.into_iter();
            let key = positional.next().unwrap_or_default();
            let default = positional.next();
            let removed = dict.borrow_mut().remove(&key).map_err(unhashable)?;
            match (removed, default) {
                (Some(value), _) | (None, Some(value)) => Ok(value),
                (None, None) => Err(EvalError::KeyNotFound {
                    key: key.repr(),
                    location,
                }),
            }
        }
        "setdefault" => {
            args.arity(1, 2)?;
            let mut positional = args.positional.into_iter();
            let key = positional.next().unwrap_or_default();
            let default = positional.next().unwrap_or_default();
            let existing = dict.borrow().get(&key).map_err(unhashable)?.cloned();
            match existing {
                Some(value) => Ok(value),
                None => {
                    dict.borrow_mut()
                        .insert(key, default.clone())
                        .map_err(unhashable)?;
                    Ok(default)
                }
            }
        }
        "update" => {
            let keywords = std::mem::take(&mut args.keywords);
            args.arity(0, 1)?;
            let mut pairs: Vec<(Value, Value)> = match args.positional.first() {
                Some(Value::Dict(other)) => other
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
                Some(other) => iterate(other, location)?
                    .into_iter()
                    .map(|item| pair_of(&item, location))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            pairs.extend(keywords.into_iter().map(|(key, value)| (Value::Str(key), value)));

            let mut dict = dict.borrow_mut();
            for (key, value) in pairs {
                dict.insert(key, value).map_err(unhashable)?;
            }
            Ok(Value::None)
        }
        _ => Err(unsupported(&Value::Dict(Rc::clone(dict)), args)),
    }
}

/// A two-element sequence used as a `(key, value)` pair
fn pair_of(item: &Value, location: SourceLocation) -> Result<(Value, Value), EvalError> {
    let elements = iterate(item, location)?;
    match <[Value; 2]>::try_from(elements) {
        Ok([key, value]) => Ok((key, value)),
        Err(elements) => Err(EvalError::value_error(
            format!(
                "dictionary update sequence element has length {}; 2 is required",
                elements.len()
            ),
            location,
        )),
    }
}

// ---------------------------------------------------------------- set

fn set_method(set: &Rc<RefCell<SetStore>>, args: CallArgs) -> Result<Value, EvalError> {
    let location = args.location;
    let unhashable = |e| EvalError::unhashable(e, location);
    match args.name.as_str() {
        "add" => {
            let [item] = args.exact()?;
            set.borrow_mut().insert(item).map_err(unhashable)?;
            Ok(Value::None)
        }
        "remove" => {
            let [item] = args.exact()?;
            if set.borrow_mut().remove(&item).map_err(unhashable)? {
                Ok(Value::None)
            } else {
                Err(EvalError::KeyNotFound {
                    key: item.repr(),
                    location,
                })
            }
        }
        "discard" => {
            let [item] = args.exact()?;
            set.borrow_mut().remove(&item).map_err(unhashable)?;
            Ok(Value::None)
        }
        _ => Err(unsupported(&Value::Set(Rc::clone(set)), args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(receiver: &Value, method: &str, positional: Vec<Value>) -> Result<Value, EvalError> {
        Analyzer::call_method(
            receiver,
            CallArgs::new(method, positional, SourceLocation::new(1, 1)),
        )
    }

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|&n| Value::Int(n)).collect())
    }

    #[test]
    fn test_list_mutation_is_shared() {
        let nums = ints(&[3, 1]);
        let alias = nums.clone();
        call(&nums, "append", vec![Value::Int(2)]).unwrap();
        call(&nums, "sort", vec![]).unwrap();
        assert_eq!(alias.repr(), "[1, 2, 3]");
        assert_eq!(call(&nums, "pop", vec![]).unwrap().repr(), "3");
        call(&nums, "insert", vec![Value::Int(-10), Value::Int(0)]).unwrap();
        assert_eq!(alias.repr(), "[0, 1, 2]");
    }

    #[test]
    fn test_list_errors() {
        let empty = ints(&[]);
        assert!(matches!(
            call(&empty, "pop", vec![]).unwrap_err(),
            EvalError::IndexOutOfRange { .. }
        ));
        assert!(matches!(
            call(&empty, "remove", vec![Value::Int(1)]).unwrap_err(),
            EvalError::ValueError { .. }
        ));
    }

    #[test]
    fn test_extend_with_itself() {
        let nums = ints(&[1, 2]);
        call(&nums, "extend", vec![nums.clone()]).unwrap();
        assert_eq!(nums.repr(), "[1, 2, 1, 2]");
        assert_eq!(call(&nums, "count", vec![Value::Int(1)]).unwrap().repr(), "2");
        assert_eq!(call(&nums, "index", vec![Value::Int(2)]).unwrap().repr(), "1");
    }

    #[test]
    fn test_string_methods() {
        let text = Value::str("  Hello World  ");
        assert_eq!(call(&text, "strip", vec![]).unwrap().repr(), "'Hello World'");
        assert_eq!(
            call(&text, "split", vec![]).unwrap().repr(),
            "['Hello', 'World']"
        );
        assert_eq!(
            call(&Value::str("a,b,,c"), "split", vec![Value::str(",")]).unwrap().repr(),
            "['a', 'b', '', 'c']"
        );
        assert_eq!(
            call(&Value::str("-"), "join", vec![Value::list(vec![Value::str("a"), Value::str("b")])])
                .unwrap()
                .repr(),
            "'a-b'"
        );
        assert_eq!(
            call(&Value::str("héllo"), "find", vec![Value::str("l")]).unwrap().repr(),
            "2"
        );
        assert_eq!(
            call(&Value::str("hello world"), "title", vec![]).unwrap().repr(),
            "'Hello World'"
        );
        assert_eq!(
            call(&Value::str("aaa"), "replace", vec![Value::str("a"), Value::str("b"), Value::Int(2)])
                .unwrap()
                .repr(),
            "'bba'"
        );
    }

    #[test]
    fn test_startswith_tuple() {
        let prefixes = Value::tuple(vec![Value::str("x"), Value::str("he")]);
        assert_eq!(
            call(&Value::str("hello"), "startswith", vec![prefixes]).unwrap().repr(),
            "True"
        );
    }

    #[test]
    fn test_dict_methods() {
        let dict = Value::dict(DictStore::new());
        call(&dict, "setdefault", vec![Value::str("a"), Value::Int(1)]).unwrap();
        assert_eq!(call(&dict, "get", vec![Value::str("a")]).unwrap().repr(), "1");
        assert_eq!(call(&dict, "get", vec![Value::str("z")]).unwrap().repr(), "None");
        call(
            &dict,
            "update",
            vec![Value::list(vec![Value::tuple(vec![Value::str("b"), Value::Int(2)])])],
        )
        .unwrap();
        assert_eq!(call(&dict, "items", vec![]).unwrap().repr(), "[('a', 1), ('b', 2)]");
        assert!(matches!(
            call(&dict, "pop", vec![Value::str("z")]).unwrap_err(),
            EvalError::KeyNotFound { .. }
        ));
    }

    #[test]
    fn test_set_methods() {
        let set = Value::set(SetStore::new());
        call(&set, "add", vec![Value::Int(1)]).unwrap();
        call(&set, "add", vec![Value::Int(1)]).unwrap();
        call(&set, "discard", vec![Value::Int(7)]).unwrap();
        assert_eq!(set.repr(), "{1}");
        assert!(call(&set, "remove", vec![Value::Int(7)]).is_err());
    }

    #[test]
    fn test_unsupported_method() {
        let err = call(&Value::Int(1), "append", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "'int' object has no supported method 'append' at line 1");
    }
}
