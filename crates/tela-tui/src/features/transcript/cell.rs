//! Transcript cells.
//!
//! A cell is one visual block in the transcript: a user prompt, an
//! assistant reply, a notice, or an error. Cells are identified by a
//! stable id so streaming updates can find their target after other
//! cells have been appended.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stable identifier for a transcript cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(Uuid);

impl CellId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CellId {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCell {
    /// A prompt the user submitted.
    User {
        id: CellId,
        created_at: DateTime<Utc>,
        content: String,
    },
    /// An assistant reply, possibly still streaming in.
    Assistant {
        id: CellId,
        created_at: DateTime<Utc>,
        content: String,
        is_streaming: bool,
        is_interrupted: bool,
    },
    /// Informational line from the app itself.
    Notice {
        id: CellId,
        created_at: DateTime<Utc>,
        content: String,
    },
    /// A failed turn or command.
    Error {
        id: CellId,
        created_at: DateTime<Utc>,
        message: String,
    },
}

impl HistoryCell {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            id: CellId::new(),
            created_at: Utc::now(),
            content: content.into(),
        }
    }

    /// An empty assistant cell that deltas will be appended to.
    pub fn assistant_streaming() -> Self {
        Self::Assistant {
            id: CellId::new(),
            created_at: Utc::now(),
            content: String::new(),
            is_streaming: true,
            is_interrupted: false,
        }
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::Notice {
            id: CellId::new(),
            created_at: Utc::now(),
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            id: CellId::new(),
            created_at: Utc::now(),
            message: message.into(),
        }
    }

    pub fn id(&self) -> CellId {
        match self {
            Self::User { id, .. }
            | Self::Assistant { id, .. }
            | Self::Notice { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::User { created_at, .. }
            | Self::Assistant { created_at, .. }
            | Self::Notice { created_at, .. }
            | Self::Error { created_at, .. } => *created_at,
        }
    }

    /// Appends streamed text to a streaming assistant cell.
    ///
    /// Panics on any other cell kind; callers route by id and only
    /// assistant cells receive deltas.
    pub fn append_assistant_delta(&mut self, text: &str) {
        match self {
            Self::Assistant { content, .. } => content.push_str(text),
            other => panic!("append_assistant_delta on non-assistant cell: {other:?}"),
        }
    }

    /// Marks an assistant cell complete, replacing its content with the
    /// authoritative final text.
    pub fn finalize_assistant(&mut self, final_text: &str) {
        match self {
            Self::Assistant {
                content,
                is_streaming,
                ..
            } => {
                final_text.clone_into(content);
                *is_streaming = false;
            }
            other => panic!("finalize_assistant on non-assistant cell: {other:?}"),
        }
    }

    /// Stops streaming without touching content, for turns that end
    /// abnormally.
    pub fn stop_streaming(&mut self) {
        if let Self::Assistant { is_streaming, .. } = self {
            *is_streaming = false;
        }
    }

    /// Replaces the content of a completed assistant cell, used when
    /// canvas edits are spliced back in.
    pub fn replace_assistant_content(&mut self, content: &str) {
        if let Self::Assistant {
            content: existing, ..
        } = self
        {
            content.clone_into(existing);
        }
    }

    /// Marks a streaming assistant cell as cut short, keeping the
    /// partial content it accumulated.
    pub fn mark_interrupted(&mut self) {
        if let Self::Assistant {
            is_streaming,
            is_interrupted,
            ..
        } = self
        {
            *is_streaming = false;
            *is_interrupted = true;
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            Self::Assistant {
                is_streaming: true,
                ..
            }
        )
    }
}
