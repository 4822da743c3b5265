//! Turn spawning and interruption.

use anyhow::Result;
use tela_core::core::{create_event_channel, interrupt, run_canvas_turn, run_turn};
use tela_core::providers::ChatClient;

use crate::events::UiEvent;
use crate::state::AppState;

/// Spawns a chat turn on the runtime's executor.
///
/// The returned event carries the receiving end of the turn's stream;
/// dispatching it moves the agent to `Waiting`. The task's own Result
/// is dropped: every failure path inside the turn has already emitted
/// an `Error` or `Interrupted` event on the channel.
pub fn spawn_turn(app: &AppState, canvas_mode: bool) -> Result<UiEvent> {
    let client = ChatClient::from_config(&app.config)?;
    let (tx, rx) = create_event_channel();
    let messages = app.chat.messages.clone();

    tokio::spawn(async move {
        let _ = if canvas_mode {
            run_canvas_turn(&client, messages, tx).await
        } else {
            run_turn(&client, messages, tx).await
        };
    });

    Ok(UiEvent::TurnSpawned { rx })
}

/// Raises the interrupt flag for the running turn. The turn notices on
/// its next poll and answers with an `Interrupted` event.
pub fn interrupt_turn(app: &AppState) {
    if app.agent.is_running() {
        interrupt::trigger_ctrl_c();
    }
}
