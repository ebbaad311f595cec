//! Memory model of the snippet interpreter
//!
//! This module provides the core data abstractions:
//! - [`value`]: Runtime value representation (scalars, shared containers, tuples)
//! - [`store`]: Insertion-ordered storage behind sets and dicts
//! - [`format`]: `str()` / `repr()` text of values
//! - [`Context`]: the flat variable namespace of one analysis
//!
//! # Namespace
//!
//! There is no scoping: a snippet has one global namespace, created fresh for
//! each analysis. The context remembers the order in which names were first
//! bound so state snapshots list variables the way the snippet introduced them.

pub mod format;
pub mod store;
pub mod value;

use rustc_hash::FxHashMap;
use value::Value;

/// Variable bindings of one analysis
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: FxHashMap<String, Value>,
    /// Names in first-bind order
    order: Vec<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bind `name`, replacing any previous value
    pub fn set(&mut self, name: &str, value: Value) {
        if self.values.insert(name.to_string(), value).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bindings in first-bind order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.as_str(), v)))
    }

    /// Deep copy whose containers share nothing with this context
    pub fn detached_copy(&self) -> Context {
        Context {
            values: self
                .values
                .iter()
                .map(|(name, value)| (name.clone(), value.deep_copy()))
                .collect(),
            order: self.order.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_order_survives_rebinding() {
        let mut context = Context::new();
        context.set("b", Value::Int(1));
        context.set("a", Value::Int(2));
        context.set("b", Value::Int(3));

        let names: Vec<&str> = context.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(context.get("b").and_then(Value::as_int), Some(3));
    }

    #[test]
    fn test_detached_copy_does_not_alias() {
        let mut context = Context::new();
        context.set("xs", Value::list(vec![Value::Int(1)]));
        let copy = context.detached_copy();

        if let Some(Value::List(items)) = copy.get("xs") {
            items.borrow_mut().clear();
        }

        assert_eq!(context.get("xs").map(|v| v.to_string()), Some("[1]".to_string()));
    }
}
