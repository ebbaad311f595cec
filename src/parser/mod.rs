//! Snippet source parser
//!
//! This module transforms snippet source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization with indentation tracking (source text → tokens)
//! - [`parse`]: Parser state, helpers and the [`parse_source`] entry point
//! - `statements` / `expressions`: recursive descent over statements and
//!   expressions, as `impl Parser` blocks
//! - [`ast`]: AST node definitions
//! - [`unparse`]: AST → canonical source text
//!
//! # Supported Subset
//!
//! - Statements: assignment (plain, chained, unpacking, augmented, subscript),
//!   expression statements, `if`/`elif`/`else`, `for`, `while`, `pass`,
//!   `break`, `continue`
//! - Expressions: literals, list/tuple/set/dict displays, arithmetic, bitwise,
//!   comparisons, `and`/`or`/`not`, conditional expressions, calls with
//!   keyword arguments, method calls, subscripts and slices
//! - No `def`, `class`, `return`, `import`, comprehensions or lambdas
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod unparse;

pub use parse::{parse_source, ParseError};
