//! `for` loop tracing and simulation
//!
//! A top-level `for` statement is not simply executed: it is traced. The
//! trace records
//!
//! - which name is the loop variable (the *iterator*) and where the items
//!   come from (the *iterable source*),
//! - a formula for every name assigned directly in the body, computed once
//!   from the raw body before anything runs,
//! - per step, the lines printed and a snapshot of every bound name.
//!
//! The body itself runs silently against the live context, so later
//! top-level statements see the loop's effects while the display entries keep
//! their pre-loop data. A `for` nested inside a simulated body is executed
//! plainly, without tracing. `break` and `continue` are propagated via
//! [`LoopBodyResult`] so the drivers can react without inspecting
//! `control_flow` directly.

use crate::interpreter::constants::INDEX_MARKER;
use crate::interpreter::engine::{Analyzer, ControlFlow};
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::iterate;
use crate::memory::value::Value;
use crate::parser::ast::*;
use crate::parser::unparse::unparse;
use crate::snapshot::{OutputLog, StateSnapshot};
use tracing::debug;

/// Result returned by [`Analyzer::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
}

/// Items of a traced loop and the name they are displayed under
struct ResolvedIterable {
    items: Vec<Value>,
    source: Option<String>,
}

impl Analyzer {
    /// Executes all statements in `body` and consumes any pending jump.
    pub(crate) fn execute_loop_body(&mut self, body: &[Stmt]) -> LoopBodyResult {
        self.execute_block(body);
        match std::mem::replace(&mut self.control_flow, ControlFlow::Normal) {
            ControlFlow::Break => LoopBodyResult::Break,
            ControlFlow::Continue | ControlFlow::Normal => LoopBodyResult::Continue,
        }
    }

    /// Trace a top-level `for` loop, replacing the previous loop's trace.
    pub(crate) fn trace_for_loop(&mut self, target: &Target, iter: &Expr, body: &[Stmt]) {
        self.trace.begin();

        let (iterator, index_name) = loop_names(target, iter);
        if let Some(index_name) = index_name {
            self.trace
                .add_dependency(&index_name, INDEX_MARKER.to_string());
        }

        let iterable = match self.resolve_iterable(iter) {
            Ok(iterable) => iterable,
            Err(err) => {
                self.report(&format!("Evaluation error: {err}"));
                ResolvedIterable {
                    items: Vec::new(),
                    source: None,
                }
            }
        };
        self.trace.iterator = iterator.clone();
        self.trace.iterable = iterable.source;

        if let Some(iterator) = &iterator {
            self.analyze_dependencies(iterator, body);
        }

        debug!(
            iterator = iterator.as_deref().unwrap_or("-"),
            items = iterable.items.len(),
            "simulating loop"
        );
        self.simulate(target, iterable.items, body);
    }

    /// Run the body once per item (up to the iteration cap), recording the
    /// output and the bound names after every step.
    fn simulate(&mut self, target: &Target, items: Vec<Value>, body: &[Stmt]) {
        let saved_output = std::mem::take(&mut self.output);
        let was_silent = std::mem::replace(&mut self.silent, true);

        for (step, item) in items.into_iter().take(self.config.max_iterations).enumerate() {
            self.output = OutputLog::new();

            let result = match self.assign_target(target, item) {
                Ok(()) => self.execute_loop_body(body),
                Err(err) => {
                    self.report(&format!("Evaluation error: {err}"));
                    LoopBodyResult::Continue
                }
            };

            if !self.output.is_empty() {
                self.trace
                    .iteration_outputs
                    .insert(step, self.output.lines());
            }
            self.trace
                .iteration_states
                .insert(step, StateSnapshot::capture(&self.context));

            if let LoopBodyResult::Break = result {
                debug!(step, "loop left early");
                break;
            }
        }

        self.output = saved_output;
        self.silent = was_silent;
    }

    /// A `for` inside a simulated body: executed plainly, capped, unrecorded.
    pub(crate) fn execute_nested_for(&mut self, target: &Target, iter: &Expr, body: &[Stmt]) {
        let items = match self
            .evaluate_expr(iter)
            .and_then(|value| iterate(&value, iter.location()))
        {
            Ok(items) => items,
            Err(err) => {
                self.report(&format!("Evaluation error: {err}"));
                return;
            }
        };

        for item in items.into_iter().take(self.config.max_iterations) {
            if let Err(err) = self.assign_target(target, item) {
                self.report(&format!("Evaluation error: {err}"));
                return;
            }
            match self.execute_loop_body(body) {
                LoopBodyResult::Break => break,
                LoopBodyResult::Continue => continue,
            }
        }
    }

    /// Items of a traced loop.
    ///
    /// A `range(...)` call is also shown as an array entry named after its
    /// source text; `enumerate(inner[, start])` resolves `inner` the same way.
    fn resolve_iterable(&mut self, iter: &Expr) -> Result<ResolvedIterable, EvalError> {
        match iter {
            Expr::Name(name, _) => {
                let value = self.evaluate_expr(iter)?;
                Ok(ResolvedIterable {
                    items: iterate(&value, iter.location())?,
                    source: Some(name.clone()),
                })
            }

            Expr::Call { func, .. } if func == "range" => {
                let value = self.evaluate_expr(iter)?;
                let name = unparse(iter);
                self.structures.record(&name, &value);
                Ok(ResolvedIterable {
                    items: iterate(&value, iter.location())?,
                    source: Some(name),
                })
            }

            Expr::Call {
                func,
                args,
                keywords,
                location,
            } if func == "enumerate" && (1..=2).contains(&args.len()) => {
                let inner = self.resolve_iterable(&args[0])?;
                let start = match (args.get(1), keywords.iter().find(|k| k.name == "start")) {
                    (Some(expr), _) | (None, Some(Keyword { value: expr, .. })) => {
                        self.evaluate_expr(expr)?
                    }
                    (None, None) => Value::Int(0),
                };
                let start = start.as_int().ok_or_else(|| {
                    EvalError::type_mismatch(
                        format!(
                            "'{}' object cannot be interpreted as an integer",
                            start.type_name()
                        ),
                        *location,
                    )
                })?;

                let items = inner
                    .items
                    .into_iter()
                    .zip(start..)
                    .map(|(item, index)| Value::tuple(vec![Value::Int(index), item]))
                    .collect();
                Ok(ResolvedIterable {
                    items,
                    source: inner.source,
                })
            }

            other => {
                let value = self.evaluate_expr(other)?;
                Ok(ResolvedIterable {
                    items: iterate(&value, other.location())?,
                    source: None,
                })
            }
        }
    }

    /// Record a formula for every direct assignment in `body`.
    ///
    /// Expressions mentioning the loop variable keep their source text; the
    /// others are evaluated against a detached copy of the context, so the
    /// live bindings never change here.
    fn analyze_dependencies(&mut self, iterator: &str, body: &[Stmt]) {
        let detached = self.context.detached_copy();
        let saved_context = std::mem::replace(&mut self.context, detached);
        let saved_output = std::mem::take(&mut self.output);
        let was_silent = std::mem::replace(&mut self.silent, true);

        for stmt in body {
            match stmt {
                Stmt::Assign { targets, value, .. } => {
                    for target in targets {
                        if let Target::Name(name, _) = target {
                            let formula = self.formula(iterator, value);
                            self.trace.add_dependency(name, formula);
                        }
                    }
                }
                Stmt::AugAssign {
                    target: Target::Name(name, name_location),
                    op,
                    value,
                    location,
                } => {
                    let desugared = Expr::BinaryOp {
                        op: *op,
                        left: Box::new(Expr::Name(name.clone(), *name_location)),
                        right: Box::new(value.clone()),
                        location: *location,
                    };
                    let formula = self.formula(iterator, &desugared);
                    self.trace.add_dependency(name, formula);
                }
                _ => {}
            }
        }

        self.context = saved_context;
        self.output = saved_output;
        self.silent = was_silent;
    }

    fn formula(&mut self, iterator: &str, expr: &Expr) -> String {
        if expr.references(iterator) {
            return unparse(expr);
        }
        match self.evaluate_expr(expr) {
            Ok(value) => value.to_string(),
            Err(err) => {
                debug!(%err, "dependency kept as source text");
                unparse(expr)
            }
        }
    }
}

/// The loop variable and, for `for i, x in enumerate(...)`, the index name
fn loop_names(target: &Target, iter: &Expr) -> (Option<String>, Option<String>) {
    match target {
        Target::Name(name, _) => (Some(name.clone()), None),
        Target::Tuple(elements, _) => {
            let is_enumerate = matches!(iter, Expr::Call { func, .. } if func == "enumerate");
            match elements.as_slice() {
                [Target::Name(index, _), Target::Name(element, _)] if is_enumerate => {
                    (Some(element.clone()), Some(index.clone()))
                }
                _ => (first_name(target), None),
            }
        }
        Target::Subscript { .. } => (None, None),
    }
}

fn first_name(target: &Target) -> Option<String> {
    match target {
        Target::Name(name, _) => Some(name.clone()),
        Target::Tuple(elements, _) => elements.iter().find_map(first_name),
        Target::Subscript { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use serde_json::json;

    fn run(source: &str) -> Analyzer {
        let program = parse_source(source).unwrap();
        let mut analyzer = Analyzer::new();
        analyzer.execute_block(&program.body);
        analyzer
    }

    #[test]
    fn test_range_loop_registers_synthetic_entry() {
        let analyzer = run("for n in range(1, 4):\n    print(n * n)\n");
        assert_eq!(analyzer.trace.iterable.as_deref(), Some("range(1, 4)"));
        assert_eq!(analyzer.trace.iterator.as_deref(), Some("n"));
        assert!(analyzer.structures.contains("range(1, 4)"));
        assert_eq!(analyzer.trace.iteration_outputs[&2], vec!["9"]);
        assert!(analyzer.output.is_empty());
    }

    #[test]
    fn test_enumerate_binding() {
        let analyzer = run("letters = ['a', 'b']\nfor i, ch in enumerate(letters, 1):\n    last = ch\n");
        assert_eq!(analyzer.trace.iterator.as_deref(), Some("ch"));
        assert_eq!(analyzer.trace.iterable.as_deref(), Some("letters"));
        assert_eq!(analyzer.trace.dependencies[0].name, "i");
        assert_eq!(analyzer.trace.dependencies[0].formula, "_index");
        assert_eq!(analyzer.trace.dependencies[1].formula, "ch");
        assert_eq!(analyzer.trace.iteration_states[&1].get("i"), Some(&json!(2)));
    }

    #[test]
    fn test_dependencies_do_not_touch_live_context() {
        let analyzer = run("base = 10\nfor x in [1, 2]:\n    y = base * 2\n    total += x\n");
        let deps = &analyzer.trace.dependencies;
        assert_eq!(deps[0].name, "y");
        assert_eq!(deps[0].formula, "20");
        assert_eq!(deps[1].formula, "total + x");
        assert!(!analyzer.structures.contains("y"));
    }

    #[test]
    fn test_break_and_continue() {
        let analyzer = run(
            "for k in [1, 2, 3, 4]:\n    if k == 2:\n        continue\n    if k == 3:\n        break\n    print(k)\n",
        );
        assert_eq!(analyzer.trace.iteration_outputs.len(), 1);
        assert_eq!(analyzer.trace.iteration_states.len(), 3);
    }

    #[test]
    fn test_failed_iterable_records_empty_loop() {
        let analyzer = run("for v in missing:\n    print(v)\n");
        assert!(analyzer.trace.has_loop);
        assert!(analyzer.trace.iteration_states.is_empty());
        assert_eq!(
            analyzer.output.lines(),
            vec!["Evaluation error: name 'missing' is not defined at line 1"]
        );
    }

    #[test]
    fn test_nested_loop_runs_plainly() {
        let analyzer = run("for a in [1, 2]:\n    for b in [10, 20]:\n        print(a + b)\n");
        assert_eq!(analyzer.trace.iteration_outputs[&0], vec!["11", "21"]);
        assert_eq!(analyzer.trace.iterator.as_deref(), Some("a"));
    }
}
