// Constants for the snippet analyzer

/// Default number of loop iterations simulated per traced `for` loop
pub const MAX_ITERATIONS: usize = 100;

/// Largest sequence `range()` or repetition may materialize
pub const MAX_SEQUENCE_LEN: usize = 10_000;

/// Display value of a loop variable that never received an entry
pub const UNKNOWN_VALUE: &str = "?";

/// Formula recorded for the index half of `for i, x in enumerate(...)`
pub const INDEX_MARKER: &str = "_index";
