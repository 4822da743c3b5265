//! Applies chat events to the transcript, the canvas, and the agent
//! state machine.
//!
//! Deltas are not written to cells immediately: they accumulate in
//! `AgentState::Streaming::pending_delta` and land in one append per
//! frame via [`apply_pending_delta`], which keeps wide streams from
//! re-wrapping the transcript on every chunk. Lifecycle events flush
//! the pending text first so nothing is lost at the boundary.

use std::mem;

use tela_core::core::events::ChatEvent;
use tela_core::core::interrupt;
use tela_core::providers::ChatMessage;

use super::cell::{CellId, HistoryCell};
use super::state::TranscriptState;
use crate::common::text::truncate_with_ellipsis;
use crate::features::canvas::{self, CanvasState};
use crate::state::{AgentState, ChatState};

/// Longest error detail shown in the transcript; full payloads go to
/// the log file.
const ERROR_DETAIL_MAX: usize = 200;

/// Routes one chat event into state. Pure state transition except for
/// clearing the process interrupt flag once an interruption has been
/// acknowledged.
pub fn handle_chat_event(
    transcript: &mut TranscriptState,
    canvas: &mut CanvasState,
    agent: &mut AgentState,
    chat: &mut ChatState,
    event: &ChatEvent,
) {
    match event {
        ChatEvent::TurnStarted => {}

        ChatEvent::AssistantDelta { text } => {
            handle_delta(transcript, agent, text);
        }

        ChatEvent::AssistantCompleted { text } => {
            apply_pending_delta(transcript, agent);
            if let AgentState::Streaming { cell_id, .. } = agent {
                let cell_id = *cell_id;
                if let Some(cell) = transcript.cell_mut(cell_id) {
                    cell.finalize_assistant(text);
                }
                canvas::update::finish_turn(canvas, cell_id, text);
            } else if matches!(agent, AgentState::Waiting { .. }) {
                // Completion without any delta; show it whole.
                let mut cell = HistoryCell::assistant_streaming();
                cell.finalize_assistant(text);
                let cell_id = transcript.push(cell);
                canvas::update::finish_turn(canvas, cell_id, text);
            }
        }

        ChatEvent::CanvasDelta { text } => {
            canvas::update::stream_delta(canvas, text);
        }

        ChatEvent::CanvasCompleted { text } => {
            canvas::update::finish_generating(canvas, text);
            if let Some(id) = canvas.take_generating_notice() {
                transcript.remove_cell(id);
            }
        }

        ChatEvent::Error {
            message, details, ..
        } => {
            apply_pending_delta(transcript, agent);
            if let AgentState::Streaming { cell_id, .. } = agent
                && let Some(cell) = transcript.cell_mut(*cell_id)
            {
                cell.stop_streaming();
            }

            let mut text = message.clone();
            if let Some(details) = details
                && !details.is_empty()
            {
                text.push('\n');
                text.push_str(&truncate_with_ellipsis(details, ERROR_DETAIL_MAX));
            }
            transcript.push(HistoryCell::error(text));

            canvas::update::abort_stream(canvas);
            if let Some(id) = canvas.take_generating_notice() {
                transcript.remove_cell(id);
            }
            *agent = AgentState::Idle;
        }

        ChatEvent::Interrupted { partial_content } => {
            apply_pending_delta(transcript, agent);
            match mem::replace(agent, AgentState::Idle) {
                AgentState::Streaming { cell_id, .. } => {
                    if let Some(cell) = transcript.cell_mut(cell_id) {
                        cell.mark_interrupted();
                    }
                    // Keep what the model already said so the next turn
                    // has the same context the user saw.
                    if let Some(partial) = partial_content
                        && !partial.is_empty()
                    {
                        chat.messages.push(ChatMessage::assistant(partial));
                    }
                }
                AgentState::Waiting { .. } => {
                    transcript.push(HistoryCell::notice("Interrupted."));
                }
                AgentState::Idle => {}
            }
            interrupt::reset();

            canvas::update::abort_stream(canvas);
            if let Some(id) = canvas.take_generating_notice() {
                transcript.remove_cell(id);
            }
        }

        ChatEvent::TurnCompleted { messages, .. } => {
            apply_pending_delta(transcript, agent);
            if let AgentState::Streaming { cell_id, .. } = agent
                && let Some(cell) = transcript.cell_mut(*cell_id)
            {
                cell.stop_streaming();
            }
            chat.messages.clone_from(messages);
            if let Some(id) = canvas.take_generating_notice() {
                transcript.remove_cell(id);
            }
            *agent = AgentState::Idle;
        }

        ChatEvent::UsageUpdate {
            input_tokens,
            output_tokens,
        } => {
            chat.input_tokens += input_tokens;
            chat.output_tokens += output_tokens;
        }
    }
}

/// Accumulates a delta, opening the streaming cell on the first one.
///
/// A delta arriving after the current cell was finalized (a second
/// completion block in the same turn) opens a fresh cell rather than
/// appending to settled text.
fn handle_delta(transcript: &mut TranscriptState, agent: &mut AgentState, text: &str) {
    match mem::replace(agent, AgentState::Idle) {
        AgentState::Waiting { rx } => {
            let cell_id = transcript.push(HistoryCell::assistant_streaming());
            *agent = AgentState::Streaming {
                rx,
                cell_id,
                pending_delta: text.to_string(),
            };
        }
        AgentState::Streaming {
            rx,
            cell_id,
            mut pending_delta,
        } => {
            let needs_new_cell = transcript
                .cell(cell_id)
                .is_none_or(|cell| !cell.is_streaming());
            if needs_new_cell {
                let cell_id = transcript.push(HistoryCell::assistant_streaming());
                *agent = AgentState::Streaming {
                    rx,
                    cell_id,
                    pending_delta: text.to_string(),
                };
            } else {
                pending_delta.push_str(text);
                *agent = AgentState::Streaming {
                    rx,
                    cell_id,
                    pending_delta,
                };
            }
        }
        // No turn in flight: a stale delta from a torn-down stream.
        AgentState::Idle => {}
    }
}

/// Flushes accumulated delta text into the streaming cell. Returns the
/// cell id when content changed so the caller can refresh the canvas.
pub fn apply_pending_delta(
    transcript: &mut TranscriptState,
    agent: &mut AgentState,
) -> Option<CellId> {
    let AgentState::Streaming {
        cell_id,
        pending_delta,
        ..
    } = agent
    else {
        return None;
    };
    if pending_delta.is_empty() {
        return None;
    }
    let text = mem::take(pending_delta);
    let cell_id = *cell_id;
    match transcript.cell_mut(cell_id) {
        Some(cell) if cell.is_streaming() => {
            cell.append_assistant_delta(&text);
            Some(cell_id)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use tela_core::core::events::{ChatEvent, ErrorKind, create_event_channel};

    use super::*;
    use crate::features::canvas::{CanvasPanel, CanvasSource};

    struct Harness {
        transcript: TranscriptState,
        canvas: CanvasState,
        agent: AgentState,
        chat: ChatState,
    }

    impl Harness {
        fn waiting() -> Self {
            let (_tx, rx) = create_event_channel();
            Self {
                transcript: TranscriptState::default(),
                canvas: CanvasState::default(),
                agent: AgentState::Waiting { rx },
                chat: ChatState::default(),
            }
        }

        fn handle(&mut self, event: &ChatEvent) {
            handle_chat_event(
                &mut self.transcript,
                &mut self.canvas,
                &mut self.agent,
                &mut self.chat,
                event,
            );
        }

        fn flush(&mut self) -> Option<CellId> {
            apply_pending_delta(&mut self.transcript, &mut self.agent)
        }

        fn delta(&mut self, text: &str) {
            self.handle(&ChatEvent::AssistantDelta {
                text: text.to_string(),
            });
        }

        fn streaming_cell_id(&self) -> CellId {
            match &self.agent {
                AgentState::Streaming { cell_id, .. } => *cell_id,
                other => panic!("agent not streaming: {other:?}"),
            }
        }
    }

    #[test]
    fn test_first_delta_opens_streaming_cell() {
        let mut h = Harness::waiting();
        h.delta("Hel");
        h.delta("lo");

        let id = h.streaming_cell_id();
        assert!(matches!(
            h.transcript.cell(id),
            Some(HistoryCell::Assistant { content, .. }) if content.is_empty()
        ));

        assert_eq!(h.flush(), Some(id));
        assert!(matches!(
            h.transcript.cell(id),
            Some(HistoryCell::Assistant { content, .. }) if content == "Hello"
        ));
        assert_eq!(h.flush(), None, "nothing pending after a flush");
    }

    #[test]
    fn test_completion_text_is_authoritative() {
        let mut h = Harness::waiting();
        h.delta("draft that got dro");
        h.handle(&ChatEvent::AssistantCompleted {
            text: "The final answer.".to_string(),
        });

        let id = h.streaming_cell_id();
        let cell = h.transcript.cell(id).expect("cell exists");
        assert!(!cell.is_streaming());
        assert!(matches!(
            cell,
            HistoryCell::Assistant { content, .. } if content == "The final answer."
        ));
    }

    #[test]
    fn test_completion_with_code_block_opens_canvas_view() {
        let mut h = Harness::waiting();
        h.delta("streaming");
        let final_text = "Here:\n```rust\nfn main() {}\n```\ndone";
        h.handle(&ChatEvent::AssistantCompleted {
            text: final_text.to_string(),
        });

        let id = h.streaming_cell_id();
        assert!(matches!(
            h.canvas.panel,
            CanvasPanel::View { source: CanvasSource::Cell(cell), .. } if cell == id
        ));
    }

    #[test]
    fn test_delta_after_finalized_cell_opens_a_new_one() {
        let mut h = Harness::waiting();
        h.delta("part one");
        h.handle(&ChatEvent::AssistantCompleted {
            text: "part one".to_string(),
        });
        let first = h.streaming_cell_id();

        h.delta("part two");
        let second = h.streaming_cell_id();
        assert_ne!(first, second);
        h.flush();
        assert!(matches!(
            h.transcript.cell(second),
            Some(HistoryCell::Assistant { content, .. }) if content == "part two"
        ));
    }

    #[test]
    fn test_error_settles_cell_and_reports() {
        let mut h = Harness::waiting();
        h.delta("partial");
        h.handle(&ChatEvent::Error {
            kind: ErrorKind::RateLimit,
            message: "Rate limited by the API".to_string(),
            details: Some("retry-after: 30".to_string()),
        });

        assert!(matches!(h.agent, AgentState::Idle));
        let cells = h.transcript.cells();
        assert!(matches!(
            &cells[cells.len() - 1],
            HistoryCell::Error { message, .. }
                if message == "Rate limited by the API\nretry-after: 30"
        ));
        assert!(matches!(
            &cells[cells.len() - 2],
            HistoryCell::Assistant { content, is_streaming: false, .. } if content == "partial"
        ));
    }

    #[test]
    fn test_error_closes_live_canvas() {
        let mut h = Harness::waiting();
        h.delta("```rust\na\nb\nc\nd\ne");
        let id = h.flush().expect("delta applied");
        canvas::update::track_live(&mut h.canvas, id, "```rust\na\nb\nc\nd\ne");
        assert!(h.canvas.is_visible());

        h.handle(&ChatEvent::Error {
            kind: ErrorKind::Network,
            message: "connection reset".to_string(),
            details: None,
        });
        assert!(!h.canvas.is_visible());
    }

    #[test]
    fn test_interrupt_while_streaming_keeps_partial() {
        let mut h = Harness::waiting();
        h.delta("partial thought");
        h.handle(&ChatEvent::Interrupted {
            partial_content: Some("partial thought".to_string()),
        });

        assert!(matches!(h.agent, AgentState::Idle));
        let cells = h.transcript.cells();
        assert!(matches!(
            cells.last(),
            Some(HistoryCell::Assistant {
                content,
                is_interrupted: true,
                is_streaming: false,
                ..
            }) if content == "partial thought"
        ));
        assert_eq!(h.chat.messages.len(), 1);
        assert_eq!(h.chat.messages[0].role, "assistant");
        assert_eq!(h.chat.messages[0].content, "partial thought");
    }

    #[test]
    fn test_interrupt_before_any_delta_posts_notice() {
        let mut h = Harness::waiting();
        h.handle(&ChatEvent::Interrupted {
            partial_content: None,
        });

        assert!(matches!(h.agent, AgentState::Idle));
        assert!(matches!(
            h.transcript.cells().last(),
            Some(HistoryCell::Notice { content, .. }) if content == "Interrupted."
        ));
        assert!(h.chat.messages.is_empty());
    }

    #[test]
    fn test_turn_completed_syncs_conversation() {
        let mut h = Harness::waiting();
        h.chat.messages.push(ChatMessage::user("hi"));
        h.delta("hello");
        h.handle(&ChatEvent::TurnCompleted {
            final_text: "hello".to_string(),
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
        });

        assert!(matches!(h.agent, AgentState::Idle));
        assert_eq!(h.chat.messages.len(), 2);
        assert_eq!(h.chat.messages[1].content, "hello");
    }

    #[test]
    fn test_canvas_stream_routes_to_panel_and_drops_notice() {
        let mut h = Harness::waiting();
        let notice = h.transcript.push(HistoryCell::notice("Generating code in the canvas..."));
        h.canvas.set_generating_notice(notice);

        h.handle(&ChatEvent::CanvasDelta {
            text: "```py\n".to_string(),
        });
        h.handle(&ChatEvent::CanvasDelta {
            text: "x = 1\n```".to_string(),
        });
        assert!(matches!(h.canvas.panel, CanvasPanel::Generating { .. }));
        assert!(h.transcript.cell(notice).is_some(), "notice stays while generating");

        h.handle(&ChatEvent::CanvasCompleted {
            text: "```py\nx = 1\n```".to_string(),
        });
        assert!(matches!(
            &h.canvas.panel,
            CanvasPanel::View { source: CanvasSource::Buffer(b), .. } if b == "```py\nx = 1\n```"
        ));
        assert!(h.transcript.cell(notice).is_none(), "notice removed on completion");
    }

    #[test]
    fn test_usage_updates_accumulate() {
        let mut h = Harness::waiting();
        h.handle(&ChatEvent::UsageUpdate {
            input_tokens: 100,
            output_tokens: 20,
        });
        h.handle(&ChatEvent::UsageUpdate {
            input_tokens: 40,
            output_tokens: 5,
        });
        assert_eq!(h.chat.input_tokens, 140);
        assert_eq!(h.chat.output_tokens, 25);
    }

    #[test]
    fn test_stale_delta_while_idle_is_dropped() {
        let mut h = Harness::waiting();
        h.agent = AgentState::Idle;
        h.delta("ghost");
        assert!(matches!(h.agent, AgentState::Idle));
        assert!(h.transcript.is_empty());
    }
}
