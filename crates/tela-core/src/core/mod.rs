//! Core module: UI-agnostic domain and runtime.
//!
//! This module contains:
//! - `events`: Chat event types for streaming
//! - `interrupt`: Signal handling for graceful interruption
//! - `turn`: Turn runner and event channels

pub mod events;
pub mod interrupt;
pub mod turn;

pub use events::{
    ChatEvent, ChatEventRx, ChatEventTx, DEFAULT_EVENT_CHANNEL_CAPACITY, ErrorKind, EventSender,
    create_event_channel,
};
pub use interrupt::InterruptedError;
pub use turn::{TurnOutcome, run_canvas_turn, run_turn};
