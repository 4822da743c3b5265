//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime
//! executes. They represent I/O and task spawning only; the reducer
//! itself never touches the network, the clipboard, or the filesystem.

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Spawn a chat turn with the current conversation.
    StartTurn,

    /// Spawn a `/canvas` turn (generate code, then explain it).
    StartCanvasTurn,

    /// Interrupt the running turn.
    InterruptTurn,

    /// Copy text to the system clipboard.
    CopyToClipboard { text: String },

    /// Open the config file in the default system editor.
    OpenConfig,
}
