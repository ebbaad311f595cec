//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting and the traced loop's header
//! - [`structures`]: Final display entries, or the state captured after one iteration
//! - [`terminal`]: Printed output of the run or of one iteration
//! - [`loop_info`]: Loop variable, iterable, dependencies and subscript operations
//! - [`status`]: Status bar with keybindings and position
//!
//! Each pane module exports a primary `render_*` function. Panes are
//! stateless apart from the scroll offset the caller owns.

pub mod loop_info;
pub mod source;
pub mod status;
pub mod structures;
pub mod terminal;

pub use loop_info::{render_loop_pane, LoopRenderData};
pub use source::render_source_pane;
pub use status::render_status_bar;
pub use structures::{render_structures_pane, StructureRow, StructuresRenderData};
pub use terminal::render_output_pane;
