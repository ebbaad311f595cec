// Analysis engine for snippets

use crate::interpreter::constants::{MAX_ITERATIONS, UNKNOWN_VALUE};
use crate::memory::Context;
use crate::parser::ast::Program;
use crate::parser::parse_source;
use crate::snapshot::result::{Analysis, AnalysisResult};
use crate::snapshot::{EntryKind, IndexLog, LoopTrace, OutputLog, StructureBuilder};
use serde_json::json;
use tracing::debug;

/// Tunable limits of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Steps simulated per traced loop
    pub max_iterations: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Pending jump out of the statement being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
}

/// Interprets one snippet and records what the visualizer needs
pub struct Analyzer {
    pub(crate) config: AnalyzerConfig,

    /// Variable bindings
    pub(crate) context: Context,

    /// Active output buffer; swapped out while a loop body is simulated
    pub(crate) output: OutputLog,

    /// Display entries, updated by top-level statements only
    pub(crate) structures: StructureBuilder,

    pub(crate) index_log: IndexLog,

    /// Details of the most recent traced loop
    pub(crate) trace: LoopTrace,

    /// Set while simulating a loop body: no structure updates, no index
    /// operations, no nested tracing
    pub(crate) silent: bool,

    pub(crate) control_flow: ControlFlow,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Analyzer {
            config,
            context: Context::new(),
            output: OutputLog::new(),
            structures: StructureBuilder::new(),
            index_log: IndexLog::new(),
            trace: LoopTrace::default(),
            silent: false,
            control_flow: ControlFlow::Normal,
        }
    }

    /// Interpret `program` and collect the result
    pub fn run(mut self, program: &Program) -> Analysis {
        debug!(statements = program.body.len(), "analysis started");
        self.execute_block(&program.body);
        self.apply_loop_fixups();
        self.finish()
    }

    /// Make sure the traced iterator and every dependency target have an
    /// entry, even when the snippet never bound them at top level
    fn apply_loop_fixups(&mut self) {
        if let Some(iterator) = &self.trace.iterator {
            if !self.structures.contains(iterator) {
                self.structures
                    .add_or_update(iterator, EntryKind::Variable, json!(UNKNOWN_VALUE));
            }
        }
        for dependency in &self.trace.dependencies {
            if !self.structures.contains(&dependency.name) {
                self.structures.add_or_update(
                    &dependency.name,
                    EntryKind::Variable,
                    json!(dependency.formula),
                );
            }
        }
    }

    fn finish(self) -> Analysis {
        let Analyzer {
            structures,
            index_log,
            trace,
            output,
            ..
        } = self;
        Analysis {
            structures: structures.into_entries(),
            has_loop: trace.has_loop,
            target: trace.iterable,
            iterator: trace.iterator,
            loop_dependencies: trace.dependencies,
            index_operations: index_log.into_operations(),
            output: output.lines(),
            iteration_outputs: trace.iteration_outputs,
            iteration_state: trace.iteration_states,
        }
    }
}

/// Analyze a snippet with the default limits
pub fn analyze(source: &str) -> AnalysisResult {
    analyze_with_config(source, AnalyzerConfig::default())
}

pub fn analyze_with_config(source: &str, config: AnalyzerConfig) -> AnalysisResult {
    if source.trim().is_empty() {
        return AnalysisResult::Blank;
    }
    match parse_source(source) {
        Ok(program) => {
            AnalysisResult::Complete(Box::new(Analyzer::with_config(config).run(&program)))
        }
        Err(err) => {
            debug!(%err, "snippet rejected by the parser");
            AnalysisResult::SyntaxError {
                message: format!("Syntax Error: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_skips_parsing() {
        assert_eq!(analyze("   \n\t"), AnalysisResult::Blank);
    }

    #[test]
    fn test_syntax_error_is_rendered() {
        let result = analyze("x = (1, 2");
        let message = result.error().unwrap();
        assert!(message.starts_with("Syntax Error: "), "{message}");
        assert!(message.contains("line 1"), "{message}");
        assert!(result.structures().is_empty());
    }

    #[test]
    fn test_fixups_add_placeholders() {
        let result = analyze("for i in range(3):\n    total = i * 2\n");
        let analysis = result.analysis().unwrap();
        let iterator = result.structure("i").unwrap();
        assert_eq!(iterator.data, json!("?"));
        let total = result.structure("total").unwrap();
        assert_eq!(total.data, json!("i * 2"));
        assert_eq!(analysis.iterator.as_deref(), Some("i"));
        assert_eq!(analysis.target.as_deref(), Some("range(3)"));
    }

    #[test]
    fn test_config_limits_iterations() {
        let config = AnalyzerConfig { max_iterations: 2 };
        let result = analyze_with_config("for i in range(10):\n    print(i)\n", config);
        let analysis = result.analysis().unwrap();
        assert_eq!(analysis.iteration_outputs.len(), 2);
    }
}
