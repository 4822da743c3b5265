//! UI event types.
//!
//! Everything that can drive a state transition funnels through
//! [`UiEvent`] so the reducer stays the single place state changes.

use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseEvent};
use tela_core::core::{ChatEvent, ChatEventRx};

/// Events consumed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick: spinner animation and delta coalescing.
    Tick,

    /// Start of an event batch, carrying the current terminal size.
    Frame { width: u16, height: u16 },

    /// Key press from the terminal.
    Key(KeyEvent),

    /// Mouse event from the terminal.
    Mouse(MouseEvent),

    /// Bracketed paste from the terminal.
    Paste(String),

    /// Event from the in-flight turn.
    Chat(Arc<ChatEvent>),

    /// A turn task was spawned; the receiver feeds its events back into
    /// the loop.
    TurnSpawned { rx: ChatEventRx },
}
