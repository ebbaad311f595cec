//! Render expressions back to canonical source text
//!
//! Output follows Python's `ast.unparse` conventions: binary operators are
//! spaced (`target - num`), strings use `repr` quoting, tuples are always
//! parenthesized and parentheses are emitted only where precedence needs them.

use crate::memory::format::{float_repr, string_repr};
use crate::parser::ast::*;

/// Binding strength used to decide where parentheses are needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Tuple,
    Test,
    Or,
    And,
    Not,
    Cmp,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Atom,
}

impl Precedence {
    fn next(self) -> Self {
        match self {
            Precedence::Tuple => Precedence::Test,
            Precedence::Test => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Cmp,
            Precedence::Cmp => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Shift,
            Precedence::Shift => Precedence::Arith,
            Precedence::Arith => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Power,
            Precedence::Power | Precedence::Atom => Precedence::Atom,
        }
    }

    fn of_binop(op: BinOp) -> Self {
        match op {
            BinOp::BitOr => Precedence::BitOr,
            BinOp::BitXor => Precedence::BitXor,
            BinOp::BitAnd => Precedence::BitAnd,
            BinOp::Shl | BinOp::Shr => Precedence::Shift,
            BinOp::Add | BinOp::Sub => Precedence::Arith,
            BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => {
                Precedence::Term
            }
            BinOp::Pow => Precedence::Power,
        }
    }
}

/// Render an expression as source text
pub fn unparse(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, Precedence::Test);
    out
}

fn write_expr(out: &mut String, expr: &Expr, context: Precedence) {
    match expr {
        Expr::Int(n, _) => out.push_str(&n.to_string()),
        Expr::Float(x, _) => out.push_str(&float_repr(*x)),
        Expr::Str(s, _) => out.push_str(&string_repr(s)),
        Expr::Bool(b, _) => out.push_str(if *b { "True" } else { "False" }),
        Expr::NoneLiteral(_) => out.push_str("None"),
        Expr::Name(name, _) => out.push_str(name),
        Expr::List { elements, .. } => {
            out.push('[');
            write_comma_separated(out, elements);
            out.push(']');
        }
        Expr::Tuple { elements, .. } => {
            out.push('(');
            write_comma_separated(out, elements);
            if elements.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Expr::Set { elements, .. } => {
            out.push('{');
            write_comma_separated(out, elements);
            out.push('}');
        }
        Expr::Dict { entries, .. } => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, key, Precedence::Test);
                out.push_str(": ");
                write_expr(out, value, Precedence::Test);
            }
            out.push('}');
        }
        Expr::BinaryOp {
            op, left, right, ..
        } => {
            let own = Precedence::of_binop(*op);
            // `**` is right-associative, everything else left-associative
            let (left_prec, right_prec) = if *op == BinOp::Pow {
                (own.next(), own)
            } else {
                (own, own.next())
            };
            delimit(out, own < context, |out| {
                write_expr(out, left, left_prec);
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                write_expr(out, right, right_prec);
            });
        }
        Expr::UnaryOp { op, operand, .. } => {
            let own = if *op == UnaryOp::Not {
                Precedence::Not
            } else {
                Precedence::Factor
            };
            delimit(out, own < context, |out| {
                out.push_str(op.symbol());
                write_expr(out, operand, own);
            });
        }
        Expr::BoolOp { op, values, .. } => {
            let (own, word) = match op {
                BoolOp::And => (Precedence::And, " and "),
                BoolOp::Or => (Precedence::Or, " or "),
            };
            delimit(out, own < context, |out| {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(word);
                    }
                    write_expr(out, value, own.next());
                }
            });
        }
        Expr::Compare {
            left, comparisons, ..
        } => {
            delimit(out, Precedence::Cmp < context, |out| {
                write_expr(out, left, Precedence::Cmp.next());
                for (op, right) in comparisons {
                    out.push(' ');
                    out.push_str(op.symbol());
                    out.push(' ');
                    write_expr(out, right, Precedence::Cmp.next());
                }
            });
        }
        Expr::IfExp {
            test, body, orelse, ..
        } => {
            delimit(out, Precedence::Test < context, |out| {
                write_expr(out, body, Precedence::Test.next());
                out.push_str(" if ");
                write_expr(out, test, Precedence::Test.next());
                out.push_str(" else ");
                write_expr(out, orelse, Precedence::Test);
            });
        }
        Expr::Call {
            func,
            args,
            keywords,
            ..
        } => {
            out.push_str(func);
            write_arguments(out, args, keywords);
        }
        Expr::MethodCall {
            receiver,
            method,
            args,
            keywords,
            ..
        } => {
            write_receiver(out, receiver);
            out.push('.');
            out.push_str(method);
            write_arguments(out, args, keywords);
        }
        Expr::Subscript { value, index, .. } => {
            write_expr(out, value, Precedence::Atom);
            out.push('[');
            match index.as_ref() {
                // A tuple index is written bare: `grid[1, 2]`
                Expr::Tuple { elements, .. } if !elements.is_empty() => {
                    write_comma_separated(out, elements);
                    if elements.len() == 1 {
                        out.push(',');
                    }
                }
                other => write_expr(out, other, Precedence::Tuple),
            }
            out.push(']');
        }
        Expr::Slice {
            lower, upper, step, ..
        } => {
            if let Some(lower) = lower {
                write_expr(out, lower, Precedence::Test);
            }
            out.push(':');
            if let Some(upper) = upper {
                write_expr(out, upper, Precedence::Test);
            }
            if let Some(step) = step {
                out.push(':');
                write_expr(out, step, Precedence::Test);
            }
        }
    }
}

/// Integer literals need parentheses before `.method` (`(1).bit_length()`)
fn write_receiver(out: &mut String, receiver: &Expr) {
    if matches!(receiver, Expr::Int(..)) {
        out.push('(');
        write_expr(out, receiver, Precedence::Atom);
        out.push(')');
    } else {
        write_expr(out, receiver, Precedence::Atom);
    }
}

fn write_arguments(out: &mut String, args: &[Expr], keywords: &[Keyword]) {
    out.push('(');
    write_comma_separated(out, args);
    for (i, keyword) in keywords.iter().enumerate() {
        if i > 0 || !args.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&keyword.name);
        out.push('=');
        write_expr(out, &keyword.value, Precedence::Test);
    }
    out.push(')');
}

fn write_comma_separated(out: &mut String, elements: &[Expr]) {
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, element, Precedence::Test);
    }
}

fn delimit(out: &mut String, parenthesize: bool, body: impl FnOnce(&mut String)) {
    if parenthesize {
        out.push('(');
        body(out);
        out.push(')');
    } else {
        body(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn roundtrip(source: &str) -> String {
        let mut parser = Parser::new(source).unwrap();
        unparse(&parser.parse_testlist().unwrap())
    }

    #[test]
    fn test_binary_spacing() {
        assert_eq!(roundtrip("target-num"), "target - num");
        assert_eq!(roundtrip("total+i*2"), "total + i * 2");
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(roundtrip("(a + b) * c"), "(a + b) * c");
        assert_eq!(roundtrip("a + (b * c)"), "a + b * c");
        assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
        assert_eq!(roundtrip("(-2) ** 2"), "(-2) ** 2");
        assert_eq!(roundtrip("2 ** -1"), "2 ** (-1)");
    }

    #[test]
    fn test_calls_and_strings() {
        assert_eq!(roundtrip("range(1,6)"), "range(1, 6)");
        assert_eq!(roundtrip("\"hi\""), "'hi'");
        assert_eq!(roundtrip("sorted(xs, reverse=True)"), "sorted(xs, reverse=True)");
        assert_eq!(roundtrip("s.split(',')"), "s.split(',')");
    }

    #[test]
    fn test_subscripts_and_slices() {
        assert_eq!(roundtrip("arr[i+1]"), "arr[i + 1]");
        assert_eq!(roundtrip("arr[1:]"), "arr[1:]");
        assert_eq!(roundtrip("arr[::2]"), "arr[::2]");
        assert_eq!(roundtrip("arr[:n]"), "arr[:n]");
    }

    #[test]
    fn test_tuples_and_comparisons() {
        assert_eq!(roundtrip("a, b"), "(a, b)");
        assert_eq!(roundtrip("(1,)"), "(1,)");
        assert_eq!(roundtrip("x not in seen"), "x not in seen");
        assert_eq!(roundtrip("not a and b"), "not a and b");
        assert_eq!(roundtrip("x if x > 0 else -x"), "x if x > 0 else -x");
    }
}
