//! Feature slices for the TUI (state/update/render per slice).

pub mod canvas;
pub mod input;
pub mod transcript;
