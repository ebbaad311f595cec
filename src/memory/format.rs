//! Text conversion of runtime values
//!
//! [`Value`]'s `Display` impl is the language's `str()`: strings print bare,
//! containers print their elements with `repr()` quoting. [`Value::repr`]
//! quotes strings as well. Floats use the shortest round-trip digits with
//! `repr` exponent rules.

use super::value::{Value, MAX_NESTING};
use std::fmt::{self, Write};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl Value {
    /// Quoted, round-trippable text (`repr()`)
    pub fn repr(&self) -> String {
        let mut out = String::new();
        write_repr(&mut out, self, 0);
        out
    }
}

fn write_repr(out: &mut String, value: &Value, depth: usize) {
    if depth > MAX_NESTING {
        out.push_str("...");
        return;
    }
    match value {
        Value::None => out.push_str("None"),
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(x) => out.push_str(&float_repr(*x)),
        Value::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
        Value::Str(s) => out.push_str(&string_repr(s)),
        Value::List(items) => {
            out.push('[');
            write_items(out, items.borrow().iter(), depth);
            out.push(']');
        }
        Value::Tuple(items) => {
            out.push('(');
            write_items(out, items.iter(), depth);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::Set(set) => {
            let set = set.borrow();
            if set.is_empty() {
                out.push_str("set()");
            } else {
                out.push('{');
                write_items(out, set.values(), depth);
                out.push('}');
            }
        }
        Value::Dict(dict) => {
            out.push('{');
            for (i, (key, value)) in dict.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, key, depth + 1);
                out.push_str(": ");
                write_repr(out, value, depth + 1);
            }
            out.push('}');
        }
    }
}

fn write_items<'a>(
    out: &mut String,
    items: impl Iterator<Item = &'a Value>,
    depth: usize,
) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(out, item, depth + 1);
    }
}

/// Shortest round-trip float text: `2.5`, `3.0`, `1e-05`, `1.5e+16`, `inf`
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits as `d.ddde<exp>`
    let scientific = format!("{x:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let plain = format!("{x}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

/// Single-quoted unless the text holds a `'` and no `"`
pub fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::{DictStore, SetStore};

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(2.5), "2.5");
        assert_eq!(float_repr(3.0), "3.0");
        assert_eq!(float_repr(-0.5), "-0.5");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.00001), "1e-05");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(float_repr(f64::INFINITY), "inf");
    }

    #[test]
    fn test_string_repr_quote_choice() {
        assert_eq!(string_repr("hi"), "'hi'");
        assert_eq!(string_repr("it's"), "\"it's\"");
        assert_eq!(string_repr("a\nb"), "'a\\nb'");
    }

    #[test]
    fn test_str_of_containers_quotes_elements() {
        let list = Value::list(vec![Value::Int(1), Value::str("a"), Value::None]);
        assert_eq!(list.to_string(), "[1, 'a', None]");

        let mut dict = DictStore::new();
        dict.insert(Value::str("k"), Value::Float(1.0)).unwrap();
        assert_eq!(Value::dict(dict).to_string(), "{'k': 1.0}");

        assert_eq!(Value::set(SetStore::new()).to_string(), "set()");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::str("plain").to_string(), "plain");
        assert_eq!(Value::Bool(true).to_string(), "True");
    }
}
