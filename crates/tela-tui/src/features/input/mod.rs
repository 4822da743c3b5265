//! Prompt input: editor buffer, history, queueing.

pub mod editor;
pub mod render;
pub mod state;
pub mod update;

pub use editor::{CursorMove, TextEditor};
pub use state::InputState;
