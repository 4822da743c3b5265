//! Side-by-side code canvas.

pub mod render;
pub mod state;
pub mod update;

pub use state::{CanvasPanel, CanvasSource, CanvasState};
