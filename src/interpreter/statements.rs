//! Statement execution
//!
//! Statements run strictly in order. An evaluation failure never escapes a
//! statement: the statement is dropped, one line describing the failure goes
//! to the active output buffer and execution continues with the next one.
//!
//! Outside silent mode, name bindings refresh their display entry and
//! subscript writes append an `assign` operation to the index log. Inside a
//! simulated loop body (silent mode) the context still changes but nothing is
//! recorded.

use crate::interpreter::engine::{Analyzer, ControlFlow};
use crate::interpreter::errors::EvalError;
use crate::interpreter::ops::access::{normalize_index, SubscriptKey};
use crate::interpreter::ops::iterate;
use crate::memory::value::Value;
use crate::parser::ast::*;
use crate::parser::unparse::unparse;
use tracing::{debug, trace};

impl Analyzer {
    /// Run `statements` until one of them raises a jump
    pub(crate) fn execute_block(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.execute_statement(stmt);
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
    }

    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) {
        trace!(line = stmt.location().line, silent = self.silent, "statement");

        match stmt {
            Stmt::Assign { targets, value, .. } => {
                let result = self
                    .evaluate_expr(value)
                    .and_then(|value| self.assign_all(targets, value));
                if let Err(err) = result {
                    let label = targets.iter().map(target_label).collect::<Vec<_>>().join(", ");
                    self.report(&format!("Evaluation error for {label}: {err}"));
                }
            }

            Stmt::AugAssign {
                target,
                op,
                value,
                location,
            } => {
                if let Err(err) = self.execute_aug_assign(target, *op, value, *location) {
                    let label = target_label(target);
                    self.report(&format!("Evaluation error for {label}: {err}"));
                }
            }

            Stmt::Expr { expr, .. } => match self.evaluate_expr(expr) {
                Ok(_) => self.refresh_method_receiver(expr),
                Err(err) => self.report(&format!("Evaluation error: {err}")),
            },

            Stmt::If {
                test, body, orelse, ..
            } => match self.evaluate_expr(test) {
                Ok(condition) if condition.is_truthy() => self.execute_block(body),
                Ok(_) => self.execute_block(orelse),
                Err(err) => self.report(&format!("Evaluation error in condition: {err}")),
            },

            Stmt::For {
                target, iter, body, ..
            } => {
                if self.silent {
                    self.execute_nested_for(target, iter, body);
                } else {
                    self.trace_for_loop(target, iter, body);
                }
            }

            Stmt::While { location, .. } => {
                if !self.silent {
                    debug!(line = location.line, "while loop noted, not simulated");
                    self.trace.has_loop = true;
                }
            }

            Stmt::Pass { .. } => {}
            Stmt::Break { .. } => self.control_flow = ControlFlow::Break,
            Stmt::Continue { .. } => self.control_flow = ControlFlow::Continue,
        }
    }

    /// Append a recovered failure to the active output buffer
    pub(crate) fn report(&mut self, line: &str) {
        debug!(silent = self.silent, "{line}");
        self.output.write_line(line);
    }

    /// `a = b = value`: every target receives the same value, left to right
    fn assign_all(&mut self, targets: &[Target], value: Value) -> Result<(), EvalError> {
        for target in targets {
            self.assign_target(target, value.clone())?;
        }
        Ok(())
    }

    /// Bind `value` to one assignment or loop target
    pub(crate) fn assign_target(&mut self, target: &Target, value: Value) -> Result<(), EvalError> {
        match target {
            Target::Name(name, _) => {
                self.bind(name, value);
                Ok(())
            }
            Target::Subscript {
                value: base,
                index,
                location,
            } => self.assign_subscript(base, index, value, *location),
            Target::Tuple(elements, location) => {
                let items = iterate(&value, *location)?;
                for (element, item) in elements.iter().zip(items) {
                    self.assign_target(element, item)?;
                }
                Ok(())
            }
        }
    }

    /// Bind a name and, outside silent mode, refresh its display entry
    pub(crate) fn bind(&mut self, name: &str, value: Value) {
        if !self.silent {
            self.structures.record(name, &value);
        }
        self.context.set(name, value);
    }

    /// `base[index] = value`.
    ///
    /// The index is evaluated once, silently; the positions logged come from
    /// [`Analyzer::resolve_indices`] over that key. A list base has every
    /// in-range position overwritten with the whole value, so a slice target
    /// such as `nums[1:3] = [9, 9]` stores the list at both positions rather
    /// than splicing it in. A dict base receives the evaluated key, any other
    /// base (including an unbound name) is left alone. The `assign` operation
    /// is logged either way; the display entry keeps the data it had before
    /// the write.
    fn assign_subscript(
        &mut self,
        base: &Expr,
        index: &Expr,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        let container = match base {
            Expr::Name(name, _) => self.context.get(name).cloned(),
            other => self.evaluate_silently(other).ok(),
        };
        let key = self.silently(|analyzer| analyzer.evaluate_subscript_key(index));
        self.write_subscript(base, container, key, value, location)
    }

    /// Store through an already evaluated key and log the write
    fn write_subscript(
        &mut self,
        base: &Expr,
        container: Option<Value>,
        key: Result<SubscriptKey, EvalError>,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        let indices = key
            .as_ref()
            .map(Self::resolve_indices)
            .unwrap_or_default();

        let stored = key.and_then(|key| match (&container, &key) {
            (Some(Value::List(items)), _) => {
                let mut items = items.borrow_mut();
                for &raw in &indices {
                    if let Some(pos) = normalize_index(raw, items.len()) {
                        items[pos] = value.clone();
                    }
                }
                Ok(())
            }
            (Some(dict @ Value::Dict(_)), SubscriptKey::Key(key)) => {
                Self::store_subscript(dict, key, value.clone(), location)
            }
            (Some(Value::Dict(_)), SubscriptKey::Slice { .. }) => Err(
                EvalError::type_mismatch("unhashable type: 'slice'", location),
            ),
            _ => Ok(()),
        });

        if !self.silent {
            let var_name = match base {
                Expr::Name(name, _) => name.clone(),
                other => unparse(other),
            };
            self.index_log.record_assign(&var_name, indices, &value);
        }
        stored
    }

    /// `x op= value`. A list target of `+=` grows in place, a subscript
    /// target evaluates its index once; everything else behaves as
    /// `x = x op value`.
    fn execute_aug_assign(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        if let (Target::Name(name, name_location), BinOp::Add) = (target, op) {
            if let Some(Value::List(items)) = self.context.get(name).cloned() {
                let extra = self.evaluate_expr(value)?;
                let extra = iterate(&extra, *name_location)?;
                items.borrow_mut().extend(extra);
                self.bind(name, Value::List(items));
                return Ok(());
            }
        }

        if let Target::Subscript {
            value: base,
            index,
            location: target_location,
        } = target
        {
            return self.aug_assign_subscript(base, index, op, value, *target_location);
        }

        let current = target_expr(target).ok_or_else(|| {
            EvalError::type_mismatch("illegal expression for augmented assignment", location)
        })?;
        let combined = Expr::BinaryOp {
            op,
            left: Box::new(current),
            right: Box::new(value.clone()),
            location,
        };
        let value = self.evaluate_expr(&combined)?;
        self.assign_target(target, value)
    }

    /// `base[index] op= value`: base and index are evaluated once, then the
    /// element is read (logging an `access`) and written back (an `assign`).
    fn aug_assign_subscript(
        &mut self,
        base: &Expr,
        index: &Expr,
        op: BinOp,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        let container = self.evaluate_expr(base)?;
        let key = self.evaluate_subscript_key(index)?;
        let current = Self::read_subscript(&container, &key, location)?;
        if !self.silent {
            if let Expr::Name(name, _) = base {
                self.index_log
                    .record_access(name, Self::resolve_indices(&key));
            }
        }

        let operand = self.evaluate_expr(value)?;
        let combined = Self::evaluate_binary_op(op, &current, &operand, location)?;
        self.write_subscript(base, Some(container), Ok(key), combined, location)
    }

    /// After `name.method(...)` on a container, show the mutated container
    fn refresh_method_receiver(&mut self, expr: &Expr) {
        if self.silent {
            return;
        }
        if let Expr::MethodCall { receiver, .. } = expr {
            if let Expr::Name(name, _) = receiver.as_ref() {
                if let Some(value) = self.context.get(name).filter(|v| v.is_container()) {
                    let value = value.clone();
                    self.structures.record(name, &value);
                }
            }
        }
    }
}

/// Source text naming an assignment target in error lines
fn target_label(target: &Target) -> String {
    match target {
        Target::Name(name, _) => name.clone(),
        Target::Tuple(elements, _) => elements.iter().map(target_label).collect::<Vec<_>>().join(", "),
        Target::Subscript { .. } => target_expr(target).map(|e| unparse(&e)).unwrap_or_default(),
    }
}

/// Read-side expression of a single target
pub(crate) fn target_expr(target: &Target) -> Option<Expr> {
    match target {
        Target::Name(name, location) => Some(Expr::Name(name.clone(), *location)),
        Target::Subscript {
            value,
            index,
            location,
        } => Some(Expr::Subscript {
            value: Box::new(value.clone()),
            index: Box::new(index.clone()),
            location: *location,
        }),
        Target::Tuple(..) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::snapshot::IndexOpKind;
    use serde_json::json;

    fn run(source: &str) -> Analyzer {
        let program = parse_source(source).unwrap();
        let mut analyzer = Analyzer::new();
        analyzer.execute_block(&program.body);
        analyzer
    }

    fn data(analyzer: &Analyzer, name: &str) -> serde_json::Value {
        analyzer
            .structures
            .entries()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.clone())
            .unwrap_or_else(|| panic!("no entry for {name}"))
    }

    #[test]
    fn test_assignment_records_entries() {
        let analyzer = run("x = 10\nname = 'bob'\npair = (1, 2)\nnothing = None");
        assert_eq!(data(&analyzer, "x"), json!(10));
        assert_eq!(data(&analyzer, "name"), json!("bob"));
        assert!(!analyzer.structures.contains("pair"));
        assert!(!analyzer.structures.contains("nothing"));
        assert!(analyzer.context.contains("pair"));
    }

    #[test]
    fn test_failed_assignment_is_reported() {
        let analyzer = run("x = missing + 1\ny = 2");
        assert!(!analyzer.context.contains("x"));
        assert_eq!(
            analyzer.output.lines(),
            vec!["Evaluation error for x: name 'missing' is not defined at line 1"]
        );
        assert_eq!(data(&analyzer, "y"), json!(2));
    }

    #[test]
    fn test_chained_and_tuple_assignment() {
        let analyzer = run("a = b = [1]\nx, y = 1, 2, 3\np, q = 'hi'");
        assert_eq!(data(&analyzer, "a"), json!([1]));
        assert_eq!(data(&analyzer, "b"), json!([1]));
        assert_eq!(data(&analyzer, "y"), json!(2));
        assert_eq!(data(&analyzer, "q"), json!("i"));
    }

    #[test]
    fn test_subscript_assignment() {
        let analyzer = run("nums = [1, 2, 3]\nnums[-1] = 9\nd = {}\nd['k'] = 4");
        assert_eq!(data(&analyzer, "nums"), json!([1, 2, 3]));
        assert_eq!(analyzer.context.get("nums").map(Value::repr).as_deref(), Some("[1, 2, 9]"));
        assert_eq!(analyzer.context.get("d").map(Value::repr).as_deref(), Some("{'k': 4}"));

        let ops = analyzer.index_log.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, IndexOpKind::Assign);
        assert_eq!(ops[0].indices, vec![-1]);
        assert_eq!(ops[0].new_value, Some(json!(9)));
    }

    #[test]
    fn test_subscript_assignment_to_unbound_name() {
        let analyzer = run("ghost[0] = 5");
        assert!(!analyzer.context.contains("ghost"));
        let ops = analyzer.index_log.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].var_name, "ghost");
        assert!(analyzer.output.is_empty());
    }

    #[test]
    fn test_augmented_assignment() {
        let analyzer = run("total = 1\ntotal += 4\nitems = [1]\nalias = items\nitems += [2]\nc = [5]\nc[0] *= 2");
        assert_eq!(data(&analyzer, "total"), json!(5));
        assert_eq!(data(&analyzer, "alias"), json!([1]));
        assert_eq!(
            analyzer.context.get("alias").map(Value::repr).as_deref(),
            Some("[1, 2]")
        );
        assert_eq!(analyzer.context.get("c").map(Value::repr).as_deref(), Some("[10]"));
        assert_eq!(analyzer.index_log.operations().len(), 2);
    }

    #[test]
    fn test_subscript_key_is_evaluated_once() {
        let analyzer = run("keys = ['x', 'y']\nd = {}\nd[keys.pop()] = 1\nleft = len(keys)");
        assert_eq!(data(&analyzer, "left"), json!(1));
        assert_eq!(analyzer.context.get("d").map(Value::repr).as_deref(), Some("{'y': 1}"));
    }

    #[test]
    fn test_augmented_subscript_evaluates_index_once() {
        let analyzer = run("counts = [0, 0, 0]\npicks = [0, 2]\ncounts[picks.pop()] += 5\nleft = len(picks)");
        assert_eq!(data(&analyzer, "left"), json!(1));
        assert_eq!(
            analyzer.context.get("counts").map(Value::repr).as_deref(),
            Some("[0, 0, 5]")
        );

        let ops = analyzer.index_log.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, IndexOpKind::Access);
        assert_eq!(ops[0].indices, vec![2]);
        assert_eq!(ops[1].kind, IndexOpKind::Assign);
        assert_eq!(ops[1].indices, vec![2]);
        assert_eq!(ops[1].new_value, Some(json!(5)));
    }

    #[test]
    fn test_slice_target_stores_whole_value_per_position() {
        let analyzer = run("nums = [1, 2, 3, 4]\nnums[1:3] = [9, 9]");
        assert_eq!(
            analyzer.context.get("nums").map(Value::repr).as_deref(),
            Some("[1, [9, 9], [9, 9], 4]")
        );
        assert_eq!(analyzer.index_log.operations()[0].indices, vec![1, 2]);
    }

    #[test]
    fn test_slice_key_on_dict_is_reported() {
        let analyzer = run("d = {}\nd[0:1] = 5");
        assert!(analyzer.output.lines()[0].contains("unhashable type: 'slice'"));
        assert_eq!(analyzer.index_log.operations().len(), 1);
    }

    #[test]
    fn test_conditional_failure_skips_both_branches() {
        let analyzer = run("if missing > 1:\n    a = 1\nelse:\n    a = 2\n");
        assert!(!analyzer.context.contains("a"));
        assert_eq!(
            analyzer.output.lines(),
            vec!["Evaluation error in condition: name 'missing' is not defined at line 1"]
        );
    }

    #[test]
    fn test_method_call_refreshes_entry() {
        let analyzer = run("nums = [3]\nnums.append(4)\nprint(len(nums))");
        assert_eq!(data(&analyzer, "nums"), json!([3, 4]));
        assert_eq!(analyzer.output.lines(), vec!["2"]);
    }

    #[test]
    fn test_while_only_marks_loop() {
        let analyzer = run("n = 0\nwhile n < 3:\n    n += 1\n");
        assert!(analyzer.trace.has_loop);
        assert_eq!(data(&analyzer, "n"), json!(0));
    }
}
