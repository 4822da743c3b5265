//! Runtime execution modes.
//!
//! - `exec`: non-interactive streaming mode (stdout/stderr)
//! - interactive chat: the full-screen TUI from `tela-tui`

pub mod exec;

pub use tela_tui::run_interactive_chat;
