//! Shared helpers used by more than one feature.

pub mod commands;
pub mod keys;
pub mod scrollbar;
pub mod text;

pub use scrollbar::Scrollbar;
