//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: viewer state, keyboard event loop, pane focus, iteration stepping
//! - **[`panes`]**: stateless render functions for each visible pane (source,
//!   structures, loop, output, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a finished
//! [`Analysis`] and call [`App::run`] to start the event loop.
//!
//! [`Analysis`]: crate::snapshot::result::Analysis
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
