//! Key handling for the editing surfaces.
//!
//! The reducer strips out global chords first; what reaches this module
//! is text editing. `handle_editor_key` is the raw editor mapping, also
//! used by canvas edit mode; `handle_input_key` adds the prompt-history
//! behavior of the main input box.

use crossterm::event::{KeyCode, KeyEvent};

use super::editor::{CursorMove, TextEditor};
use super::state::InputState;
use crate::common::keys::Modifiers;

/// Applies a key to a bare editor. Returns false for keys that mean
/// nothing to it.
pub fn handle_editor_key(editor: &mut TextEditor, key: &KeyEvent) -> bool {
    let mods = Modifiers::from_key(key);
    handle_line_editing(editor, key, mods)
        .or_else(|| handle_word_editing(editor, key, mods))
        .or_else(|| handle_cursor_keys(editor, key, mods))
        .or_else(|| handle_text_entry(editor, key, mods))
        .is_some()
}

/// Applies a key to the main input box, routing Up/Down through prompt
/// history when the cursor is at the matching edge.
pub fn handle_input_key(input: &mut InputState, key: &KeyEvent) -> bool {
    let mods = Modifiers::from_key(key);
    match key.code {
        KeyCode::Up if mods.none() => {
            if !input.try_history_up() {
                input.editor.move_cursor(CursorMove::Up);
            }
            return true;
        }
        KeyCode::Down if mods.none() => {
            if !input.try_history_down() {
                input.editor.move_cursor(CursorMove::Down);
            }
            return true;
        }
        _ => {}
    }
    handle_editor_key(&mut input.editor, key)
}

fn handle_line_editing(editor: &mut TextEditor, key: &KeyEvent, mods: Modifiers) -> Option<()> {
    if !mods.only_ctrl() {
        return None;
    }
    match key.code {
        KeyCode::Char('a') => editor.move_cursor(CursorMove::LineStart),
        KeyCode::Char('e') => editor.move_cursor(CursorMove::LineEnd),
        KeyCode::Char('u') => editor.kill_to_line_start(),
        KeyCode::Char('k') => editor.kill_to_line_end(),
        _ => return None,
    }
    Some(())
}

fn handle_word_editing(editor: &mut TextEditor, key: &KeyEvent, mods: Modifiers) -> Option<()> {
    match key.code {
        KeyCode::Char('w') if mods.only_ctrl() => editor.delete_word_left(),
        KeyCode::Backspace if mods.only_alt() => editor.delete_word_left(),
        KeyCode::Char('b') | KeyCode::Left if mods.only_alt() => {
            editor.move_cursor(CursorMove::WordLeft);
        }
        KeyCode::Char('f') | KeyCode::Right if mods.only_alt() => {
            editor.move_cursor(CursorMove::WordRight);
        }
        _ => return None,
    }
    Some(())
}

fn handle_cursor_keys(editor: &mut TextEditor, key: &KeyEvent, mods: Modifiers) -> Option<()> {
    if !mods.none() {
        return None;
    }
    match key.code {
        KeyCode::Up => editor.move_cursor(CursorMove::Up),
        KeyCode::Down => editor.move_cursor(CursorMove::Down),
        KeyCode::Left => editor.move_cursor(CursorMove::Left),
        KeyCode::Right => editor.move_cursor(CursorMove::Right),
        KeyCode::Home => editor.move_cursor(CursorMove::LineStart),
        KeyCode::End => editor.move_cursor(CursorMove::LineEnd),
        _ => return None,
    }
    Some(())
}

fn handle_text_entry(editor: &mut TextEditor, key: &KeyEvent, mods: Modifiers) -> Option<()> {
    match key.code {
        // Plain Enter is intercepted upstream for submission, so any
        // Enter reaching the editor inserts a line break.
        KeyCode::Enter if !mods.ctrl => editor.insert_newline(),
        KeyCode::Tab if mods.none() => editor.insert_str("    "),
        KeyCode::Backspace if !mods.ctrl && !mods.alt => {
            editor.delete_prev_char();
        }
        KeyCode::Delete if mods.none() => editor.delete_next_char(),
        KeyCode::Char(c) if !mods.ctrl && !mods.alt => editor.insert_char(c),
        _ => return None,
    }
    Some(())
}
