//! Snippet interpreter
//!
//! This module provides the core execution logic:
//! - [`engine`]: the [`engine::Analyzer`] state, entry points and result assembly
//! - [`errors`]: evaluation error types
//! - `expressions`, `statements`, `loops`: `impl Analyzer` blocks for each
//!   layer of the language
//! - `builtins`, `methods`: the free-function and method tables
//! - [`ops`]: operators, subscripts and index resolution
//!
//! # Execution Model
//!
//! Top-level statements run once, in order, against a single flat context.
//! Each binding refreshes the display entry of its name. A top-level `for`
//! loop is traced: its body is simulated step by step in *silent* mode, which
//! mutates the context but records nothing except the per-step output and
//! state snapshots. Evaluation failures are recovered at the statement that
//! raised them and reported as a line of output.

mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
mod loops;
mod methods;
pub mod ops;
mod statements;
