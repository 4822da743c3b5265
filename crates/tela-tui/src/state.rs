//! Application state.
//!
//! One flat struct updated by the reducer in `update.rs`; the renderer
//! reads it each frame. Nothing in here touches the terminal.

use std::time::Instant;

use tela_core::config::Config;
use tela_core::core::ChatEventRx;
use tela_core::providers::ChatMessage;

use crate::features::canvas::CanvasState;
use crate::features::input::InputState;
use crate::features::transcript::{CellId, TranscriptState};

/// Lifecycle of the in-flight turn.
///
/// The receiver for the turn's event stream lives inside the variant,
/// so dropping back to `Idle` tears the channel down with it.
#[derive(Debug)]
pub enum AgentState {
    Idle,
    /// Turn spawned, no transcript text yet.
    Waiting { rx: ChatEventRx },
    /// Deltas are streaming into a transcript cell. Incoming text is
    /// coalesced in `pending_delta` and applied on the next tick.
    Streaming {
        rx: ChatEventRx,
        cell_id: CellId,
        pending_delta: String,
    },
}

impl AgentState {
    pub fn is_running(&self) -> bool {
        !matches!(self, AgentState::Idle)
    }
}

/// The conversation sent to the model, plus usage counters.
#[derive(Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug)]
pub struct AppState {
    pub should_quit: bool,
    pub config: Config,
    pub input: InputState,
    pub transcript: TranscriptState,
    pub canvas: CanvasState,
    pub chat: ChatState,
    pub agent: AgentState,
    /// Advances every tick; drives the status line spinner.
    pub spinner_frame: u64,
    /// When the running turn was spawned, for the elapsed display.
    pub turn_started_at: Option<Instant>,
    /// Terminal size from the last frame.
    pub terminal_width: u16,
    pub terminal_height: u16,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            should_quit: false,
            config,
            input: InputState::default(),
            transcript: TranscriptState::default(),
            canvas: CanvasState::default(),
            chat: ChatState::default(),
            agent: AgentState::Idle,
            spinner_frame: 0,
            turn_started_at: None,
            terminal_width: 0,
            terminal_height: 0,
        }
    }
}
