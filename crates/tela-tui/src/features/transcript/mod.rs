//! Conversation transcript: cells, markdown styling, scroll.

pub mod cell;
pub mod markdown;
pub mod render;
pub mod state;
pub mod style;
pub mod update;

pub use cell::{CellId, HistoryCell};
pub use state::TranscriptState;
