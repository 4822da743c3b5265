//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app,
//! event)` and executes the returned effects.

use std::fmt::Write as _;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use tela_core::core::events::ChatEvent;
use tela_core::providers::ChatMessage;

use crate::common::commands::{self, SlashCommand};
use crate::common::keys::Modifiers;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::canvas::{self, CanvasPanel};
use crate::features::input::update as input_update;
use crate::features::transcript::update as transcript_update;
use crate::features::transcript::HistoryCell;
use crate::render;
use crate::state::{AgentState, AppState, ChatState};

const TURN_BUSY_NOTICE: &str = "Wait for the current turn to finish.";

/// The main reducer function.
///
/// Applies one event to the state and returns the effects the runtime
/// should execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            // Advance spinner animation, land coalesced deltas.
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            refresh_live_canvas(app);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            vec![]
        }
        UiEvent::Key(key) => handle_key(app, key),
        UiEvent::Mouse(mouse) => {
            handle_mouse(app, mouse);
            vec![]
        }
        UiEvent::Paste(text) => {
            handle_paste(app, &text);
            vec![]
        }
        UiEvent::Chat(chat_event) => handle_chat(app, &chat_event),
        UiEvent::TurnSpawned { rx } => {
            app.agent = AgentState::Waiting { rx };
            app.turn_started_at = Some(Instant::now());
            vec![]
        }
    }
}

/// Flushes pending stream text into the transcript and re-runs the
/// in-progress detection over the cell's full content.
fn refresh_live_canvas(app: &mut AppState) {
    if let Some(id) = transcript_update::apply_pending_delta(&mut app.transcript, &mut app.agent)
        && let Some(HistoryCell::Assistant { content, .. }) = app.transcript.cell(id)
    {
        canvas::update::track_live(&mut app.canvas, id, content);
    }
}

/// Per-frame housekeeping: layout sizes and delta coalescing.
fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    app.terminal_width = width;
    app.terminal_height = height;

    let viewport = render::transcript_viewport_height(app, height);
    app.transcript.scroll.set_page_size(viewport as usize);

    refresh_live_canvas(app);
}

// ============================================================================
// Key handling
// ============================================================================

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if app.canvas.is_editing() {
        return handle_canvas_edit_key(app, key);
    }

    let mods = Modifiers::from_key(&key);
    match key.code {
        KeyCode::Char('c') if mods.only_ctrl() => {
            if app.agent.is_running() {
                vec![UiEffect::InterruptTurn]
            } else {
                vec![UiEffect::Quit]
            }
        }
        KeyCode::Esc => {
            if app.agent.is_running() {
                vec![UiEffect::InterruptTurn]
            } else {
                if !app.input.is_empty() {
                    app.input.clear();
                }
                vec![]
            }
        }
        KeyCode::Char('o') if mods.only_ctrl() => {
            if let Some(notice) = canvas::update::toggle(&mut app.canvas, &app.transcript) {
                app.transcript.push(HistoryCell::notice(notice));
            }
            vec![]
        }
        KeyCode::Char('e') if mods.only_ctrl() => {
            if let Some(notice) = canvas::update::begin_edit(&mut app.canvas, &app.transcript) {
                app.transcript.push(HistoryCell::notice(notice));
            }
            vec![]
        }
        KeyCode::Char('y') if mods.only_ctrl() => copy_last_reply(app),
        KeyCode::Char('r') if mods.only_ctrl() => regenerate(app),
        KeyCode::PageUp => {
            app.transcript.scroll.page_up();
            vec![]
        }
        KeyCode::PageDown => {
            app.transcript.scroll.page_down();
            vec![]
        }
        KeyCode::Enter if mods.none() => submit(app),
        _ => {
            input_update::handle_input_key(&mut app.input, &key);
            vec![]
        }
    }
}

/// Keys while the canvas editor has focus. Everything except the edit
/// chords goes straight to the block editor.
fn handle_canvas_edit_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let mods = Modifiers::from_key(&key);
    match key.code {
        KeyCode::Esc => {
            canvas::update::close_edit(&mut app.canvas);
            vec![]
        }
        KeyCode::Char('s') if mods.only_ctrl() => {
            if let Some(notice) =
                canvas::update::save_edit(&mut app.canvas, &mut app.transcript, &mut app.chat)
            {
                app.transcript.push(HistoryCell::notice(notice));
            }
            vec![]
        }
        KeyCode::Char('c') if mods.only_ctrl() => {
            if app.agent.is_running() {
                vec![UiEffect::InterruptTurn]
            } else {
                vec![UiEffect::Quit]
            }
        }
        _ => {
            if let CanvasPanel::Edit { editor, .. } = &mut app.canvas.panel {
                input_update::handle_editor_key(editor, &key);
            }
            vec![]
        }
    }
}

// ============================================================================
// Prompt submission
// ============================================================================

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    let text = app.input.text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    match commands::parse_slash_command(trimmed) {
        Some(Ok(command)) => {
            app.input.push_history(trimmed);
            app.input.clear();
            run_command(app, command)
        }
        Some(Err(message)) => {
            app.input.push_history(trimmed);
            app.input.clear();
            app.transcript.push(HistoryCell::notice(message));
            vec![]
        }
        None => {
            let prompt = trimmed.to_string();
            app.input.push_history(&prompt);
            app.input.clear();
            if app.agent.is_running() {
                // Queued; sent when the current turn settles.
                app.input.enqueue_prompt(prompt);
                vec![]
            } else {
                submit_prompt(app, prompt)
            }
        }
    }
}

fn submit_prompt(app: &mut AppState, prompt: String) -> Vec<UiEffect> {
    app.transcript.push(HistoryCell::user(prompt.clone()));
    app.chat.messages.push(ChatMessage::user(prompt));
    app.transcript.scroll.to_bottom();
    vec![UiEffect::StartTurn]
}

fn run_command(app: &mut AppState, command: SlashCommand) -> Vec<UiEffect> {
    match command {
        SlashCommand::New => {
            if app.agent.is_running() {
                app.transcript.push(HistoryCell::notice(TURN_BUSY_NOTICE));
                return vec![];
            }
            app.chat = ChatState::default();
            app.transcript.clear();
            app.canvas.panel = CanvasPanel::Hidden;
            app.transcript
                .push(HistoryCell::notice("Started a new conversation."));
            vec![]
        }
        SlashCommand::Canvas { prompt } => {
            if app.agent.is_running() {
                app.transcript.push(HistoryCell::notice(TURN_BUSY_NOTICE));
                return vec![];
            }
            app.transcript.push(HistoryCell::user(prompt.clone()));
            app.chat.messages.push(ChatMessage::user(prompt));
            let notice = app
                .transcript
                .push(HistoryCell::notice("Generating code in the canvas..."));
            app.canvas.set_generating_notice(notice);
            app.transcript.scroll.to_bottom();
            vec![UiEffect::StartCanvasTurn]
        }
        SlashCommand::Copy => copy_last_reply(app),
        SlashCommand::Config => vec![UiEffect::OpenConfig],
        SlashCommand::Help => {
            app.transcript.push(HistoryCell::notice(help_text()));
            vec![]
        }
        SlashCommand::Quit => vec![UiEffect::Quit],
    }
}

fn copy_last_reply(app: &mut AppState) -> Vec<UiEffect> {
    match app.transcript.last_assistant_content() {
        Some(content) if !content.is_empty() => vec![UiEffect::CopyToClipboard {
            text: content.to_string(),
        }],
        _ => {
            app.transcript
                .push(HistoryCell::notice("Nothing to copy yet."));
            vec![]
        }
    }
}

/// Drops everything after the last user message and re-runs the turn.
fn regenerate(app: &mut AppState) -> Vec<UiEffect> {
    if app.agent.is_running() {
        app.transcript.push(HistoryCell::notice(TURN_BUSY_NOTICE));
        return vec![];
    }
    let Some(pos) = app.chat.messages.iter().rposition(|m| m.role == "user") else {
        app.transcript
            .push(HistoryCell::notice("Nothing to regenerate."));
        return vec![];
    };
    app.chat.messages.truncate(pos + 1);
    app.transcript.truncate_after_last_user();
    canvas::update::close_transcript_views(&mut app.canvas);
    app.transcript.scroll.to_bottom();
    vec![UiEffect::StartTurn]
}

fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for info in commands::COMMANDS {
        let _ = writeln!(text, "  {:<18} {}", info.usage, info.description);
    }
    text.push_str(
        "\nKeys: Ctrl+O canvas · Ctrl+E edit block · Ctrl+R regenerate · \
         Ctrl+Y copy · PgUp/PgDn scroll · Esc interrupt · Ctrl+C quit",
    );
    text
}

// ============================================================================
// Mouse, paste, chat events
// ============================================================================

fn handle_mouse(app: &mut AppState, mouse: MouseEvent) {
    let delta: i32 = match mouse.kind {
        MouseEventKind::ScrollUp => -3,
        MouseEventKind::ScrollDown => 3,
        _ => return,
    };

    // With the panel open the right half of the screen is the canvas.
    let over_canvas = app.canvas.is_visible() && mouse.column >= app.terminal_width / 2;
    if over_canvas {
        canvas::update::scroll_view(&mut app.canvas, delta);
    } else if delta < 0 {
        app.transcript.scroll.scroll_up(delta.unsigned_abs() as usize);
    } else {
        app.transcript.scroll.scroll_down(delta as usize);
    }
}

fn handle_paste(app: &mut AppState, text: &str) {
    if let CanvasPanel::Edit { editor, .. } = &mut app.canvas.panel {
        editor.insert_str(text);
    } else {
        app.input.editor.insert_str(text);
    }
}

fn handle_chat(app: &mut AppState, event: &ChatEvent) -> Vec<UiEffect> {
    transcript_update::handle_chat_event(
        &mut app.transcript,
        &mut app.canvas,
        &mut app.agent,
        &mut app.chat,
        event,
    );

    let turn_over = matches!(
        event,
        ChatEvent::TurnCompleted { .. } | ChatEvent::Error { .. } | ChatEvent::Interrupted { .. }
    );
    if !turn_over {
        return vec![];
    }
    app.turn_started_at = None;

    if !app.agent.is_running()
        && let Some(prompt) = app.input.pop_queued_prompt()
    {
        return submit_prompt(app, prompt);
    }
    vec![]
}
