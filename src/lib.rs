//! # Introduction
//!
//! snipviz interprets short snippets of a Python subset and records what a
//! data-structure visualizer needs: the final display entries of every named
//! value, a step-by-step trace of the most recent top-level `for` loop, the
//! subscript reads and writes, and everything printed.
//!
//! ## Analysis pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Analyzer → AnalysisResult → JSON / TUI
//! ```
//!
//! 1. [`parser`]: tokenises the source (with indentation tokens) and builds
//!    an AST; also renders expressions back to source text.
//! 2. [`interpreter`]: walks the AST with an [`Analyzer`], evaluating
//!    expressions, dispatching built-ins and methods, and tracing loops.
//! 3. [`memory`]: the value model: scalars, shared containers, the flat
//!    variable context and `str()`/`repr()` formatting.
//! 4. [`snapshot`]: display entries, index operation log, output capture,
//!    loop trace and the serializable [`AnalysisResult`].
//! 5. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! let result = snipviz::analyze("nums = [3, 1, 2]\ntotal = sum(nums)\n");
//! let total = result.structure("total").unwrap();
//! assert_eq!(total.data, serde_json::json!(6));
//! ```

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod ui;

pub use interpreter::engine::{analyze, analyze_with_config, Analyzer, AnalyzerConfig};
pub use snapshot::result::{Analysis, AnalysisResult};
