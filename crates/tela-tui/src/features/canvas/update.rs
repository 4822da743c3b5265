//! Canvas coordination.
//!
//! The panel follows a small set of rules:
//!
//! - while a reply streams, an unterminated fence of enough lines puts
//!   the panel in [`CanvasPanel::Live`], replaced wholesale per delta
//! - when the reply completes, the longest closed block (if any)
//!   becomes a [`CanvasPanel::View`] over the transcript cell;
//!   otherwise the panel closes
//! - `/canvas` turns stream into [`CanvasPanel::Generating`] and settle
//!   into a canvas-owned buffer that transcript streaming never steals
//! - edits are applied by re-deriving the block span at save time and
//!   splicing the edited text into the surrounding content
//!
//! Spans are never cached across events; the detection functions run
//! against the current content on every call.

use std::mem;

use tela_core::markdown::{
    IN_PROGRESS_MIN_LINES, contains_markdown, detect_in_progress_code_block,
    extract_longest_code_block,
};

use super::state::{CanvasPanel, CanvasSource, CanvasState};
use crate::features::input::TextEditor;
use crate::features::transcript::{CellId, HistoryCell, TranscriptState};
use crate::state::ChatState;

/// True when the panel must not be disturbed by transcript streaming:
/// the user is editing, a `/canvas` turn owns it, or it views a
/// canvas-owned buffer.
fn is_locked(panel: &CanvasPanel) -> bool {
    matches!(
        panel,
        CanvasPanel::Edit { .. }
            | CanvasPanel::Generating { .. }
            | CanvasPanel::View {
                source: CanvasSource::Buffer(_),
                ..
            }
    )
}

/// Refreshes the live view from a streaming cell's current content.
///
/// Runs the in-progress detection over the full content. A hit replaces
/// the panel text wholesale; a miss keeps whatever the panel already
/// shows, so a fence that just closed stays visible until the turn
/// completes and [`finish_turn`] takes over.
pub fn track_live(canvas: &mut CanvasState, cell_id: CellId, content: &str) {
    if is_locked(&canvas.panel) {
        return;
    }
    if let Some(found) = detect_in_progress_code_block(content, IN_PROGRESS_MIN_LINES) {
        canvas.panel = CanvasPanel::Live {
            cell_id,
            text: found.text.to_string(),
        };
    }
}

/// Settles the panel when a reply finishes.
///
/// The completed content is authoritative: if it reads as markdown and
/// holds a closed block, the cell becomes the panel's source of truth;
/// otherwise the panel closes, including a live view left over from an
/// earlier reply.
pub fn finish_turn(canvas: &mut CanvasState, cell_id: CellId, content: &str) {
    if is_locked(&canvas.panel) {
        return;
    }
    if contains_markdown(content) && extract_longest_code_block(content).is_some() {
        canvas.panel = CanvasPanel::View {
            source: CanvasSource::Cell(cell_id),
            scroll: 0,
        };
    } else {
        canvas.panel = CanvasPanel::Hidden;
    }
}

/// Appends `/canvas` phase-one output to the generating buffer, opening
/// it on the first delta.
pub fn stream_delta(canvas: &mut CanvasState, text: &str) {
    if let CanvasPanel::Generating { buffer } = &mut canvas.panel {
        buffer.push_str(text);
    } else {
        canvas.panel = CanvasPanel::Generating {
            buffer: text.to_string(),
        };
    }
}

/// Settles a finished `/canvas` generation into a viewable buffer, or
/// closes the panel when the model produced nothing.
pub fn finish_generating(canvas: &mut CanvasState, text: &str) {
    if text.trim().is_empty() {
        canvas.panel = CanvasPanel::Hidden;
    } else {
        canvas.panel = CanvasPanel::View {
            source: CanvasSource::Buffer(text.to_string()),
            scroll: 0,
        };
    }
}

/// Cleans up after an interrupted or failed stream.
///
/// A generating buffer with content is kept and frozen into a view;
/// everything transient closes. Settled views and edits are untouched.
pub fn abort_stream(canvas: &mut CanvasState) {
    match mem::take(&mut canvas.panel) {
        CanvasPanel::Generating { buffer } if !buffer.trim().is_empty() => {
            canvas.panel = CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                scroll: 0,
            };
        }
        CanvasPanel::Hidden | CanvasPanel::Live { .. } | CanvasPanel::Generating { .. } => {
            canvas.panel = CanvasPanel::Hidden;
        }
        settled @ (CanvasPanel::View { .. } | CanvasPanel::Edit { .. }) => {
            canvas.panel = settled;
        }
    }
}

/// Shows or hides the panel on user request.
///
/// Opening looks for a closed block in the last assistant reply; the
/// returned notice explains why nothing opened.
pub fn toggle(canvas: &mut CanvasState, transcript: &TranscriptState) -> Option<String> {
    if canvas.is_visible() {
        canvas.panel = CanvasPanel::Hidden;
        return None;
    }
    let Some(HistoryCell::Assistant { id, content, .. }) = transcript.last_assistant() else {
        return Some("No assistant reply yet.".to_string());
    };
    if extract_longest_code_block(content).is_none() {
        return Some("No code block in the last reply.".to_string());
    }
    canvas.panel = CanvasPanel::View {
        source: CanvasSource::Cell(*id),
        scroll: 0,
    };
    None
}

/// Switches a settled view into edit mode, seeding the editor with the
/// current block text.
pub fn begin_edit(canvas: &mut CanvasState, transcript: &TranscriptState) -> Option<String> {
    if matches!(canvas.panel, CanvasPanel::Hidden)
        && let Some(notice) = toggle(canvas, transcript)
    {
        return Some(notice);
    }
    let source = match &canvas.panel {
        CanvasPanel::Edit { .. } | CanvasPanel::Hidden => return None,
        CanvasPanel::Live { .. } | CanvasPanel::Generating { .. } => {
            return Some("Wait for the stream to finish before editing.".to_string());
        }
        CanvasPanel::View { source, .. } => source.clone(),
    };
    let block = match &source {
        CanvasSource::Cell(id) => {
            let Some(content) = assistant_content(transcript, *id) else {
                canvas.panel = CanvasPanel::Hidden;
                return Some("The reply is gone; nothing to edit.".to_string());
            };
            let Some(found) = extract_longest_code_block(content) else {
                canvas.panel = CanvasPanel::Hidden;
                return Some("The code block is gone; nothing to edit.".to_string());
            };
            found.text.to_string()
        }
        CanvasSource::Buffer(buffer) => extract_longest_code_block(buffer)
            .map_or_else(|| buffer.clone(), |found| found.text.to_string()),
    };
    canvas.panel = CanvasPanel::Edit {
        source,
        editor: TextEditor::from_text(&block),
    };
    None
}

/// Applies the edited block back to its source.
///
/// For a transcript cell the block span is re-derived from the cell's
/// current content, never from the span that existed when editing
/// began, and the edited text is spliced over it; the matching chat
/// message is rewritten so the model sees the edit on the next turn.
/// For a canvas buffer the splice happens in place, or replaces the
/// whole buffer when it has no fenced block.
pub fn save_edit(
    canvas: &mut CanvasState,
    transcript: &mut TranscriptState,
    chat: &mut ChatState,
) -> Option<String> {
    let CanvasPanel::Edit { source, editor } = &canvas.panel else {
        return None;
    };
    let source = source.clone();
    let edited = editor.text();

    match source {
        CanvasSource::Cell(id) => {
            let Some(old_content) = assistant_content(transcript, id).map(str::to_string) else {
                canvas.panel = CanvasPanel::Hidden;
                return Some("The reply is gone; the edit was not applied.".to_string());
            };
            let Some(found) = extract_longest_code_block(&old_content) else {
                canvas.panel = CanvasPanel::Hidden;
                return Some("The code block is gone; the edit was not applied.".to_string());
            };
            let new_content = splice(&old_content, found.span.start, found.span.end, &edited);

            if let Some(cell) = transcript.cell_mut(id) {
                cell.replace_assistant_content(&new_content);
            }
            if let Some(message) = chat
                .messages
                .iter_mut()
                .rev()
                .find(|m| m.role == "assistant" && m.content == old_content)
            {
                message.content = new_content;
            }
            canvas.panel = CanvasPanel::View {
                source: CanvasSource::Cell(id),
                scroll: 0,
            };
        }
        CanvasSource::Buffer(buffer) => {
            let new_buffer = match extract_longest_code_block(&buffer) {
                Some(found) => splice(&buffer, found.span.start, found.span.end, &edited),
                None => edited,
            };
            canvas.panel = CanvasPanel::View {
                source: CanvasSource::Buffer(new_buffer),
                scroll: 0,
            };
        }
    }
    None
}

/// Discards the edit and returns to the view.
pub fn close_edit(canvas: &mut CanvasState) {
    if let CanvasPanel::Edit { source, .. } = &canvas.panel {
        canvas.panel = CanvasPanel::View {
            source: source.clone(),
            scroll: 0,
        };
    }
}

/// Hides panels backed by transcript cells, for callers about to
/// rewrite the transcript. Canvas-owned buffers survive.
pub fn close_transcript_views(canvas: &mut CanvasState) {
    match &canvas.panel {
        CanvasPanel::Live { .. }
        | CanvasPanel::View {
            source: CanvasSource::Cell(_),
            ..
        }
        | CanvasPanel::Edit {
            source: CanvasSource::Cell(_),
            ..
        } => {
            canvas.panel = CanvasPanel::Hidden;
        }
        CanvasPanel::Hidden
        | CanvasPanel::Generating { .. }
        | CanvasPanel::View { .. }
        | CanvasPanel::Edit { .. } => {}
    }
}

/// Scrolls a settled view; other panel modes follow the stream tail.
pub fn scroll_view(canvas: &mut CanvasState, delta: i32) {
    if let CanvasPanel::View { scroll, .. } = &mut canvas.panel {
        let step = u16::try_from(delta.unsigned_abs()).unwrap_or(u16::MAX);
        *scroll = if delta < 0 {
            scroll.saturating_sub(step)
        } else {
            scroll.saturating_add(step)
        };
    }
}

fn assistant_content(transcript: &TranscriptState, id: CellId) -> Option<&str> {
    match transcript.cell(id)? {
        HistoryCell::Assistant { content, .. } => Some(content),
        _ => None,
    }
}

fn splice(content: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() - (end - start) + replacement.len());
    out.push_str(&content[..start]);
    out.push_str(replacement);
    out.push_str(&content[end..]);
    out
}

#[cfg(test)]
mod tests {
    use tela_core::providers::ChatMessage;

    use super::*;

    fn completed_assistant(transcript: &mut TranscriptState, text: &str) -> CellId {
        let id = transcript.push(HistoryCell::assistant_streaming());
        transcript
            .cell_mut(id)
            .expect("cell just pushed")
            .finalize_assistant(text);
        id
    }

    fn panel_text(canvas: &CanvasState) -> &str {
        match &canvas.panel {
            CanvasPanel::Live { text, .. } => text,
            CanvasPanel::Generating { buffer } => buffer,
            CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                ..
            } => buffer,
            other => panic!("panel carries no text: {other:?}"),
        }
    }

    // ========================================================================
    // Live tracking
    // ========================================================================

    #[test]
    fn test_open_fence_at_line_threshold_goes_live() {
        let mut canvas = CanvasState::default();
        let id = CellId::new();
        let content = "Here you go:\n```rust\nl1\nl2\nl3\nl4\nl5";

        track_live(&mut canvas, id, content);
        assert!(matches!(canvas.panel, CanvasPanel::Live { cell_id, .. } if cell_id == id));
        assert!(panel_text(&canvas).starts_with("```rust"));
    }

    #[test]
    fn test_open_fence_below_threshold_stays_hidden() {
        let mut canvas = CanvasState::default();
        track_live(&mut canvas, CellId::new(), "```rust\nl1\nl2\nl3\nl4");
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_live_text_is_replaced_wholesale_per_delta() {
        let mut canvas = CanvasState::default();
        let id = CellId::new();
        let mut content = String::from("```py\na\nb\nc\nd\ne");

        track_live(&mut canvas, id, &content);
        let first = panel_text(&canvas).to_string();

        content.push_str("\nf = 2");
        track_live(&mut canvas, id, &content);
        let second = panel_text(&canvas);

        assert_ne!(first, second);
        assert!(second.ends_with("f = 2"));
        assert!(second.starts_with("```py"), "text is re-detected, not appended");
    }

    #[test]
    fn test_closed_fence_keeps_prior_live_text() {
        let mut canvas = CanvasState::default();
        let id = CellId::new();
        let mut content = String::from("```js\n1\n2\n3\n4\n5");

        track_live(&mut canvas, id, &content);
        let shown = panel_text(&canvas).to_string();

        // The closing fence arrives: detection misses, the panel holds.
        content.push_str("\n```");
        track_live(&mut canvas, id, &content);
        assert_eq!(panel_text(&canvas), shown);
    }

    #[test]
    fn test_live_hands_off_to_cell_view_on_completion() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let content = "Sure:\n```rust\nl1\nl2\nl3\nl4\nl5\n```\ndone";
        let id = completed_assistant(&mut transcript, content);

        track_live(&mut canvas, id, &content[..content.len() - 8]);
        finish_turn(&mut canvas, id, content);

        assert!(matches!(
            canvas.panel,
            CanvasPanel::View {
                source: CanvasSource::Cell(cell),
                scroll: 0,
            } if cell == id
        ));
    }

    #[test]
    fn test_completion_without_block_closes_panel() {
        let mut canvas = CanvasState::default();
        let id = CellId::new();
        track_live(&mut canvas, id, "```\na\nb\nc\nd\ne");
        assert!(canvas.is_visible());

        finish_turn(&mut canvas, id, "Actually, no code needed.");
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_plain_completion_never_opens_panel() {
        let mut canvas = CanvasState::default();
        finish_turn(&mut canvas, CellId::new(), "just prose, nothing else");
        assert!(!canvas.is_visible());
    }

    // ========================================================================
    // /canvas generation
    // ========================================================================

    #[test]
    fn test_generating_accumulates_then_settles_into_buffer_view() {
        let mut canvas = CanvasState::default();
        stream_delta(&mut canvas, "```rust\n");
        stream_delta(&mut canvas, "fn main() {}\n");
        stream_delta(&mut canvas, "```");
        assert_eq!(panel_text(&canvas), "```rust\nfn main() {}\n```");

        finish_generating(&mut canvas, "```rust\nfn main() {}\n```");
        assert!(matches!(
            &canvas.panel,
            CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                ..
            } if buffer == "```rust\nfn main() {}\n```"
        ));
    }

    #[test]
    fn test_empty_generation_closes_panel() {
        let mut canvas = CanvasState::default();
        stream_delta(&mut canvas, "  \n");
        finish_generating(&mut canvas, "  \n");
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_buffer_view_ignores_transcript_streaming() {
        // Phase two of /canvas streams the explanation into the
        // transcript; the panel must keep showing the generated code.
        let mut canvas = CanvasState::default();
        finish_generating(&mut canvas, "```py\nx = 1\n```");

        let id = CellId::new();
        track_live(&mut canvas, id, "explaining:\n```\na\nb\nc\nd\ne");
        finish_turn(&mut canvas, id, "explaining:\n```\na\nb\nc\nd\ne\n```");

        assert!(matches!(
            &canvas.panel,
            CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                ..
            } if buffer == "```py\nx = 1\n```"
        ));
    }

    #[test]
    fn test_abort_freezes_generating_buffer() {
        let mut canvas = CanvasState::default();
        stream_delta(&mut canvas, "```rust\nlet a = 1;\n");
        abort_stream(&mut canvas);
        assert!(matches!(
            &canvas.panel,
            CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                ..
            } if buffer == "```rust\nlet a = 1;\n"
        ));
    }

    #[test]
    fn test_abort_closes_live_and_empty_generating() {
        let mut canvas = CanvasState::default();
        track_live(&mut canvas, CellId::new(), "```\na\nb\nc\nd\ne");
        abort_stream(&mut canvas);
        assert!(!canvas.is_visible());

        stream_delta(&mut canvas, "   ");
        abort_stream(&mut canvas);
        assert!(!canvas.is_visible());
    }

    // ========================================================================
    // Toggle
    // ========================================================================

    #[test]
    fn test_toggle_opens_view_on_last_reply_block() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let id = completed_assistant(&mut transcript, "see\n```rust\nfn f() {}\n```\nend");

        assert_eq!(toggle(&mut canvas, &transcript), None);
        assert!(matches!(
            canvas.panel,
            CanvasPanel::View { source: CanvasSource::Cell(cell), .. } if cell == id
        ));

        assert_eq!(toggle(&mut canvas, &transcript), None);
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_toggle_notices_when_nothing_to_show() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        assert_eq!(
            toggle(&mut canvas, &transcript),
            Some("No assistant reply yet.".to_string())
        );

        completed_assistant(&mut transcript, "no code here");
        assert_eq!(
            toggle(&mut canvas, &transcript),
            Some("No code block in the last reply.".to_string())
        );
        assert!(!canvas.is_visible());
    }

    // ========================================================================
    // Editing
    // ========================================================================

    #[test]
    fn test_begin_edit_seeds_editor_with_fenced_block() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        completed_assistant(&mut transcript, "intro\n```rust\nlet x = 1;\n```\noutro");

        assert_eq!(begin_edit(&mut canvas, &transcript), None);
        let CanvasPanel::Edit { editor, .. } = &canvas.panel else {
            panic!("expected edit mode, got {:?}", canvas.panel);
        };
        assert_eq!(editor.text(), "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn test_begin_edit_refuses_while_streaming() {
        let mut canvas = CanvasState::default();
        let transcript = TranscriptState::default();
        track_live(&mut canvas, CellId::new(), "```\na\nb\nc\nd\ne");

        let notice = begin_edit(&mut canvas, &transcript);
        assert_eq!(
            notice,
            Some("Wait for the stream to finish before editing.".to_string())
        );
        assert!(matches!(canvas.panel, CanvasPanel::Live { .. }));
    }

    #[test]
    fn test_save_edit_splices_block_into_cell_and_chat_message() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let mut chat = ChatState::default();
        let original = "intro\n```rust\nlet x = 1;\n```\noutro";
        let id = completed_assistant(&mut transcript, original);
        chat.messages.push(ChatMessage::user("write code"));
        chat.messages.push(ChatMessage::assistant(original));

        begin_edit(&mut canvas, &transcript);
        let CanvasPanel::Edit { editor, .. } = &mut canvas.panel else {
            panic!("expected edit mode");
        };
        editor.set_text("```rust\nlet x = 2;\n```");

        assert_eq!(save_edit(&mut canvas, &mut transcript, &mut chat), None);

        let expected = "intro\n```rust\nlet x = 2;\n```\noutro";
        assert!(matches!(
            transcript.cell(id),
            Some(HistoryCell::Assistant { content, .. }) if content == expected
        ));
        assert_eq!(chat.messages[1].content, expected);
        assert!(matches!(
            canvas.panel,
            CanvasPanel::View { source: CanvasSource::Cell(cell), .. } if cell == id
        ));
    }

    #[test]
    fn test_save_edit_rederives_span_from_current_content() {
        // The cell content changes between begin_edit and save; the
        // splice must land where the block is now, not where it was.
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let mut chat = ChatState::default();
        let id = completed_assistant(&mut transcript, "a\n```\nold\n```\nz");

        begin_edit(&mut canvas, &transcript);
        transcript
            .cell_mut(id)
            .expect("cell exists")
            .replace_assistant_content("a much longer prefix\n```\nold\n```\nz");

        let CanvasPanel::Edit { editor, .. } = &mut canvas.panel else {
            panic!("expected edit mode");
        };
        editor.set_text("```\nnew\n```");
        save_edit(&mut canvas, &mut transcript, &mut chat);

        assert!(matches!(
            transcript.cell(id),
            Some(HistoryCell::Assistant { content, .. })
                if content == "a much longer prefix\n```\nnew\n```\nz"
        ));
    }

    #[test]
    fn test_save_edit_when_block_vanished_notices_and_closes() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let mut chat = ChatState::default();
        let id = completed_assistant(&mut transcript, "x\n```\ncode\n```\ny");

        begin_edit(&mut canvas, &transcript);
        transcript
            .cell_mut(id)
            .expect("cell exists")
            .replace_assistant_content("all fences removed");

        let notice = save_edit(&mut canvas, &mut transcript, &mut chat);
        assert_eq!(
            notice,
            Some("The code block is gone; the edit was not applied.".to_string())
        );
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_buffer_edit_splices_in_place() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let mut chat = ChatState::default();
        finish_generating(&mut canvas, "```go\nold\n```");

        begin_edit(&mut canvas, &transcript);
        let CanvasPanel::Edit { editor, .. } = &mut canvas.panel else {
            panic!("expected edit mode");
        };
        editor.set_text("```go\nnew\n```");
        save_edit(&mut canvas, &mut transcript, &mut chat);

        assert!(matches!(
            &canvas.panel,
            CanvasPanel::View {
                source: CanvasSource::Buffer(buffer),
                ..
            } if buffer == "```go\nnew\n```"
        ));
    }

    #[test]
    fn test_close_edit_discards_and_returns_to_view() {
        let mut canvas = CanvasState::default();
        let mut transcript = TranscriptState::default();
        let id = completed_assistant(&mut transcript, "p\n```\nkeep me\n```\nq");

        begin_edit(&mut canvas, &transcript);
        let CanvasPanel::Edit { editor, .. } = &mut canvas.panel else {
            panic!("expected edit mode");
        };
        editor.set_text("```\nthrown away\n```");
        close_edit(&mut canvas);

        assert!(matches!(
            canvas.panel,
            CanvasPanel::View { source: CanvasSource::Cell(cell), .. } if cell == id
        ));
        assert!(matches!(
            transcript.cell(id),
            Some(HistoryCell::Assistant { content, .. }) if content == "p\n```\nkeep me\n```\nq"
        ));
    }

    // ========================================================================
    // Housekeeping
    // ========================================================================

    #[test]
    fn test_close_transcript_views_keeps_buffer_view() {
        let mut canvas = CanvasState::default();
        finish_generating(&mut canvas, "```\nmine\n```");
        close_transcript_views(&mut canvas);
        assert!(canvas.is_visible());

        canvas.panel = CanvasPanel::View {
            source: CanvasSource::Cell(CellId::new()),
            scroll: 3,
        };
        close_transcript_views(&mut canvas);
        assert!(!canvas.is_visible());
    }

    #[test]
    fn test_scroll_view_saturates_at_zero() {
        let mut canvas = CanvasState::default();
        finish_generating(&mut canvas, "```\nx\n```");
        scroll_view(&mut canvas, -5);
        assert!(matches!(canvas.panel, CanvasPanel::View { scroll: 0, .. }));

        scroll_view(&mut canvas, 7);
        scroll_view(&mut canvas, -2);
        assert!(matches!(canvas.panel, CanvasPanel::View { scroll: 5, .. }));
    }

    #[test]
    fn test_generating_notice_round_trip() {
        let mut canvas = CanvasState::default();
        assert_eq!(canvas.take_generating_notice(), None);

        let id = CellId::new();
        canvas.set_generating_notice(id);
        assert_eq!(canvas.take_generating_notice(), Some(id));
        assert_eq!(canvas.take_generating_notice(), None);
    }
}
