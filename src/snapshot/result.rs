//! Analysis result and its JSON shape
//!
//! A completed analysis serializes as
//!
//! ```text
//! { structures, hasLoop, target, iterator, loopDependencies,
//!   indexOperations, output, iterationOutputs, iterationState }
//! ```
//!
//! Blank input produces `{structures: [], hasLoop: false}` and a syntax error
//! `{structures: [], error}`, with no further fields.

use super::{Entry, IndexOperation, LoopDependency, StateSnapshot};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Everything recorded while interpreting a snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub structures: Vec<Entry>,
    pub has_loop: bool,
    /// Source name of the traced loop's iterable
    pub target: Option<String>,
    /// Name of the traced loop's variable
    pub iterator: Option<String>,
    pub loop_dependencies: Vec<LoopDependency>,
    pub index_operations: Vec<IndexOperation>,
    pub output: Vec<String>,
    pub iteration_outputs: BTreeMap<usize, Vec<String>>,
    pub iteration_state: BTreeMap<usize, StateSnapshot>,
}

/// Outcome of [`crate::analyze`]
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// Empty or whitespace-only input; the parser was not invoked
    Blank,
    /// The parser rejected the input; `message` is the rendered diagnostic
    SyntaxError { message: String },
    Complete(Box<Analysis>),
}

impl AnalysisResult {
    pub fn structures(&self) -> &[Entry] {
        match self {
            AnalysisResult::Complete(analysis) => &analysis.structures,
            AnalysisResult::Blank | AnalysisResult::SyntaxError { .. } => &[],
        }
    }

    pub fn has_loop(&self) -> bool {
        matches!(self, AnalysisResult::Complete(analysis) if analysis.has_loop)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisResult::SyntaxError { message } => Some(message),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            AnalysisResult::Complete(analysis) => Some(analysis),
            _ => None,
        }
    }

    /// Look up a structure entry by name
    pub fn structure(&self, name: &str) -> Option<&Entry> {
        self.structures().iter().find(|entry| entry.name == name)
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty: [Entry; 0] = [];
        match self {
            AnalysisResult::Blank => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("structures", &empty)?;
                map.serialize_entry("hasLoop", &false)?;
                map.end()
            }
            AnalysisResult::SyntaxError { message } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("structures", &empty)?;
                map.serialize_entry("error", message)?;
                map.end()
            }
            AnalysisResult::Complete(analysis) => analysis.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_blank_shape() {
        assert_eq!(
            serde_json::to_value(AnalysisResult::Blank).unwrap(),
            json!({"structures": [], "hasLoop": false})
        );
    }

    #[test]
    fn test_syntax_error_shape() {
        let result = AnalysisResult::SyntaxError {
            message: "Syntax Error: bad (line 1, column 2)".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"structures": [], "error": "Syntax Error: bad (line 1, column 2)"})
        );
        assert!(!result.has_loop());
    }

    #[test]
    fn test_complete_shape_uses_camel_case_and_nulls() {
        let analysis = Analysis {
            structures: Vec::new(),
            has_loop: false,
            target: None,
            iterator: None,
            loop_dependencies: Vec::new(),
            index_operations: Vec::new(),
            output: vec!["hi".to_string()],
            iteration_outputs: BTreeMap::from([(0, vec!["x".to_string()])]),
            iteration_state: BTreeMap::new(),
        };

        assert_eq!(
            serde_json::to_value(AnalysisResult::Complete(Box::new(analysis))).unwrap(),
            json!({
                "structures": [],
                "hasLoop": false,
                "target": null,
                "iterator": null,
                "loopDependencies": [],
                "indexOperations": [],
                "output": ["hi"],
                "iterationOutputs": {"0": ["x"]},
                "iterationState": {}
            })
        );
    }
}
