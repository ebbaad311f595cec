// Recorded analysis state: display entries, index log, output and loop trace

pub mod result;

use crate::memory::value::{Value, MAX_NESTING};
use crate::memory::Context;
use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Number};
use std::collections::BTreeMap;

/// Mock terminal capturing `print` output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputLog {
    text: String,
}

impl OutputLog {
    pub fn new() -> Self {
        OutputLog::default()
    }

    /// Print without newline
    pub fn write(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Print a complete line, closing any unterminated one first
    pub fn write_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Get all lines as a vector of strings
    pub fn lines(&self) -> Vec<String> {
        let mut result: Vec<String> = self.text.split('\n').map(str::to_string).collect();
        // Remove trailing empty string if text ended with newline
        if result.last().is_some_and(|s| s.is_empty()) {
            result.pop();
        }
        result
    }
}

/// Display kind of a visualization entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Variable,
    Array,
    Set,
    Dictionary,
}

impl EntryKind {
    /// Tuples and `None` have no display kind
    pub fn classify(value: &Value) -> Option<Self> {
        match value {
            Value::List(_) => Some(EntryKind::Array),
            Value::Set(_) => Some(EntryKind::Set),
            Value::Dict(_) => Some(EntryKind::Dictionary),
            Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Bool(_) => {
                Some(EntryKind::Variable)
            }
            Value::Tuple(_) | Value::None => None,
        }
    }
}

/// One named structure shown by the visualizer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub data: serde_json::Value,
}

/// Ordered, name-keyed list of display entries
#[derive(Debug, Clone, Default)]
pub struct StructureBuilder {
    entries: Vec<Entry>,
    positions: FxHashMap<String, usize>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First occurrence appends; later ones overwrite kind and data in place
    pub fn add_or_update(&mut self, name: &str, kind: EntryKind, data: serde_json::Value) {
        match self.positions.get(name) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                entry.kind = kind;
                entry.data = data;
            }
            None => {
                self.positions.insert(name.to_string(), self.entries.len());
                self.entries.push(Entry {
                    name: name.to_string(),
                    kind,
                    data,
                });
            }
        }
    }

    /// Classify and serialize `value` under `name`. Returns `false` when the
    /// value has no display kind and nothing was recorded.
    pub fn record(&mut self, name: &str, value: &Value) -> bool {
        match EntryKind::classify(value) {
            Some(kind) => {
                self.add_or_update(name, kind, entry_data(value));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

/// Kind of subscript operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOpKind {
    Access,
    Assign,
}

/// A recorded subscript read or write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOperation {
    #[serde(rename = "type")]
    pub kind: IndexOpKind,
    pub var_name: String,
    pub indices: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<serde_json::Value>,
}

/// Subscript operations in program order
#[derive(Debug, Clone, Default)]
pub struct IndexLog {
    operations: Vec<IndexOperation>,
}

impl IndexLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_access(&mut self, var_name: &str, indices: Vec<i64>) {
        self.operations.push(IndexOperation {
            kind: IndexOpKind::Access,
            var_name: var_name.to_string(),
            indices,
            new_value: None,
        });
    }

    pub fn record_assign(&mut self, var_name: &str, indices: Vec<i64>, value: &Value) {
        self.operations.push(IndexOperation {
            kind: IndexOpKind::Assign,
            var_name: var_name.to_string(),
            indices,
            new_value: Some(to_json(value)),
        });
    }

    pub fn operations(&self) -> &[IndexOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<IndexOperation> {
        self.operations
    }
}

/// A variable assigned in a loop body and how it is derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopDependency {
    pub name: String,
    pub formula: String,
}

/// Every bound name with its serialized value, in bind order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    entries: Vec<(String, serde_json::Value)>,
}

impl StateSnapshot {
    pub fn capture(context: &Context) -> Self {
        StateSnapshot {
            entries: context
                .iter()
                .map(|(name, value)| (name.to_string(), entry_data(value)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for StateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Trace of the most recent top-level `for` loop
#[derive(Debug, Clone, Default)]
pub struct LoopTrace {
    pub has_loop: bool,
    pub iterator: Option<String>,
    pub iterable: Option<String>,
    pub dependencies: Vec<LoopDependency>,
    pub iteration_outputs: BTreeMap<usize, Vec<String>>,
    pub iteration_states: BTreeMap<usize, StateSnapshot>,
}

impl LoopTrace {
    /// Start tracing a new loop, discarding the previous loop's details
    pub fn begin(&mut self) {
        *self = LoopTrace {
            has_loop: true,
            ..LoopTrace::default()
        };
    }

    /// Record a dependency unless one with the same name exists
    pub fn add_dependency(&mut self, name: &str, formula: String) {
        if self.dependencies.iter().any(|d| d.name == name) {
            return;
        }
        self.dependencies.push(LoopDependency {
            name: name.to_string(),
            formula,
        });
    }
}

/// Display data of a value: dicts become `{key, value}` text pairs, anything
/// else its JSON form.
pub fn entry_data(value: &Value) -> serde_json::Value {
    match value {
        Value::Dict(dict) => serde_json::Value::Array(
            dict.borrow()
                .iter()
                .map(|(key, value)| json!({ "key": key.to_string(), "value": value.to_string() }))
                .collect(),
        ),
        other => to_json(other),
    }
}

/// JSON form of a value; nested dicts become objects keyed by `str(key)`
pub fn to_json(value: &Value) -> serde_json::Value {
    json_at_depth(value, 0)
}

fn json_at_depth(value: &Value, depth: usize) -> serde_json::Value {
    if depth > MAX_NESTING {
        return serde_json::Value::String("...".to_string());
    }
    match value {
        Value::None => serde_json::Value::Null,
        Value::Int(n) => json!(n),
        Value::Float(x) => Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => json!(b),
        Value::Str(s) => json!(s),
        Value::List(items) => json_array(items.borrow().iter(), depth),
        Value::Tuple(items) => json_array(items.iter(), depth),
        Value::Set(set) => json_array(set.borrow().values(), depth),
        Value::Dict(dict) => {
            let mut object = Map::new();
            for (key, value) in dict.borrow().iter() {
                object.insert(key.to_string(), json_at_depth(value, depth + 1));
            }
            serde_json::Value::Object(object)
        }
    }
}

fn json_array<'a>(items: impl Iterator<Item = &'a Value>, depth: usize) -> serde_json::Value {
    serde_json::Value::Array(items.map(|v| json_at_depth(v, depth + 1)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::DictStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_log_lines() {
        let mut log = OutputLog::new();
        log.write("a b\n");
        log.write("partial");
        log.write_line("Evaluation error: boom");

        assert_eq!(log.lines(), vec!["a b", "partial", "Evaluation error: boom"]);
    }

    #[test]
    fn test_empty_print_is_blank_line() {
        let mut log = OutputLog::new();
        log.write("\n");

        assert_eq!(log.lines(), vec![""]);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_builder_updates_in_place() {
        let mut builder = StructureBuilder::new();
        builder.record("x", &Value::Int(1));
        builder.record("y", &Value::Int(2));
        builder.record("x", &Value::list(vec![Value::Int(3)]));

        let entries = builder.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "x");
        assert_eq!(entries[0].kind, EntryKind::Array);
        assert_eq!(entries[0].data, json!([3]));
    }

    #[test]
    fn test_tuple_and_none_not_recorded() {
        let mut builder = StructureBuilder::new();

        assert!(!builder.record("t", &Value::tuple(vec![Value::Int(1)])));
        assert!(!builder.record("n", &Value::None));
        assert!(builder.entries().is_empty());
    }

    #[test]
    fn test_dictionary_entry_data_is_text_pairs() {
        let mut dict = DictStore::new();
        dict.insert(Value::Int(2), Value::Int(0)).unwrap();
        dict.insert(Value::str("k"), Value::list(vec![Value::str("v")])).unwrap();

        assert_eq!(
            entry_data(&Value::dict(dict)),
            json!([{"key": "2", "value": "0"}, {"key": "k", "value": "['v']"}])
        );
    }

    #[test]
    fn test_nested_containers_in_arrays() {
        let mut dict = DictStore::new();
        dict.insert(Value::Int(1), Value::Bool(true)).unwrap();
        let value = Value::list(vec![
            Value::tuple(vec![Value::Int(0), Value::str("a")]),
            Value::dict(dict),
            Value::Float(1.5),
            Value::None,
        ]);

        assert_eq!(entry_data(&value), json!([[0, "a"], {"1": true}, 1.5, null]));
    }

    #[test]
    fn test_dependencies_first_wins() {
        let mut trace = LoopTrace::default();
        trace.begin();
        trace.add_dependency("i", "_index".to_string());
        trace.add_dependency("i", "i + 1".to_string());

        assert!(trace.has_loop);
        assert_eq!(trace.dependencies.len(), 1);
        assert_eq!(trace.dependencies[0].formula, "_index");
    }

    #[test]
    fn test_state_snapshot_serializes_in_bind_order() {
        let mut context = Context::new();
        context.set("zeta", Value::Int(1));
        context.set("alpha", Value::str("a"));
        let snapshot = StateSnapshot::capture(&context);

        let text = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":"a"}"#);
    }

    #[test]
    fn test_assign_operation_carries_new_value() {
        let mut log = IndexLog::new();
        log.record_access("arr", vec![0]);
        log.record_assign("arr", vec![1], &Value::Int(9));

        assert_eq!(
            serde_json::to_value(log.operations()).unwrap(),
            json!([
                {"type": "access", "varName": "arr", "indices": [0]},
                {"type": "assign", "varName": "arr", "indices": [1], "newValue": 9}
            ])
        );
    }
}
