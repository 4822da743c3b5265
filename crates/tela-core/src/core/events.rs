//! Chat event types for streaming and TUI.
//!
//! This module defines the contract for events emitted while a turn runs.
//! The TUI consumes them from a bounded channel; deltas are best-effort,
//! lifecycle events are reliable.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::providers::{ChatMessage, ProviderErrorKind};

/// Events emitted while running one assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Turn has started processing.
    TurnStarted,

    /// Incremental text chunk from the assistant.
    AssistantDelta { text: String },

    /// Complete response from the assistant.
    AssistantCompleted { text: String },

    /// Incremental canvas chunk (canvas mode phase 1).
    CanvasDelta { text: String },

    /// Canvas generation finished; `text` is the full generated block.
    CanvasCompleted { text: String },

    /// An error occurred during execution.
    Error {
        /// Error category for structured handling
        kind: ErrorKind,
        /// One-line summary
        message: String,
        /// Optional additional details
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },

    /// Execution was interrupted (e.g., by user signal).
    Interrupted {
        /// Partial assistant text received before interruption.
        #[serde(skip_serializing_if = "Option::is_none")]
        partial_content: Option<String>,
    },

    /// Turn completed successfully with final result.
    TurnCompleted {
        /// Final accumulated text from the assistant.
        final_text: String,
        /// Updated conversation (includes the new assistant message).
        messages: Vec<ChatMessage>,
    },

    /// Token usage update from the provider.
    UsageUpdate {
        input_tokens: u64,
        output_tokens: u64,
    },
}

/// Error categories for `ChatEvent::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials rejected
    Auth,
    /// Rate limited
    RateLimit,
    /// Malformed request rejected by the API
    InvalidRequest,
    /// Provider-side failure
    Api,
    /// Connection or timeout failure
    Network,
    /// Response parsing failed
    Parse,
    /// Internal/unknown error
    Internal,
}

impl From<ProviderErrorKind> for ErrorKind {
    fn from(kind: ProviderErrorKind) -> Self {
        match kind {
            ProviderErrorKind::Auth => ErrorKind::Auth,
            ProviderErrorKind::RateLimit => ErrorKind::RateLimit,
            ProviderErrorKind::InvalidRequest => ErrorKind::InvalidRequest,
            ProviderErrorKind::Api => ErrorKind::Api,
            ProviderErrorKind::Network => ErrorKind::Network,
            ProviderErrorKind::Parse => ErrorKind::Parse,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Auth => write!(f, "auth"),
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::InvalidRequest => write!(f, "invalid_request"),
            ErrorKind::Api => write!(f, "api"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Channel-based event sender (async, bounded).
///
/// Events are wrapped in `Arc` for cheap cloning on the consumer side.
pub type ChatEventTx = mpsc::Sender<Arc<ChatEvent>>;

/// Channel-based event receiver (async, bounded).
pub type ChatEventRx = mpsc::Receiver<Arc<ChatEvent>>;

/// Default channel capacity for event streams.
///
/// Set higher (128) to accommodate best-effort delta sends without blocking.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Creates a bounded event channel with the default capacity.
pub fn create_event_channel() -> (ChatEventTx, ChatEventRx) {
    mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY)
}

/// Event sender wrapper that provides best-effort and reliable send modes.
///
/// Use `send_delta()` for high-volume events (`AssistantDelta`,
/// `CanvasDelta`) that can be dropped if the consumer is slow; the full
/// text is re-sent at completion. Use `send_important()` for lifecycle
/// events that must be delivered.
#[derive(Clone)]
pub struct EventSender {
    tx: ChatEventTx,
}

impl EventSender {
    /// Creates a new `EventSender` wrapping the given channel sender.
    pub fn new(tx: ChatEventTx) -> Self {
        Self { tx }
    }

    /// Best-effort send: never awaits, drops if channel is full.
    pub fn send_delta(&self, ev: ChatEvent) {
        let _ = self.tx.try_send(Arc::new(ev));
    }

    /// Reliable send: awaits delivery.
    pub async fn send_important(&self, ev: ChatEvent) {
        let _ = self.tx.send(Arc::new(ev)).await;
    }
}
