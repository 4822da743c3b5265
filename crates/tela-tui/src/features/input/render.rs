//! Input area view.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::editor::TextEditor;
use crate::state::AppState;

/// Minimum height of the input area, borders included.
const INPUT_HEIGHT_MIN: u16 = 3;

/// Maximum height of the input area as a fraction of screen height.
const INPUT_HEIGHT_MAX_PERCENT: f32 = 0.4;

/// Editor content wrapped to a width, with the cursor mapped to its
/// visual position.
pub(crate) struct WrappedEditor {
    pub lines: Vec<Line<'static>>,
    /// Visual row of the cursor after wrapping.
    pub cursor_row: usize,
    /// Visual column of the cursor in display width units.
    pub cursor_col: usize,
}

/// Wraps editor content character by character on display width.
///
/// Width-based breaking keeps CJK and emoji from overflowing the
/// border; the cursor column is accumulated in width units as the wrap
/// proceeds so the terminal cursor lands on the right screen cell.
pub(crate) fn wrap_editor(editor: &TextEditor, available_width: usize) -> WrappedEditor {
    let width = available_width.max(1);
    let (cursor_line, cursor_col) = editor.cursor();

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut cursor_visual_row = 0usize;
    let mut cursor_visual_col = 0usize;

    for (line_idx, logical) in editor.lines().iter().enumerate() {
        let is_cursor_line = line_idx == cursor_line;

        if logical.is_empty() {
            if is_cursor_line {
                cursor_visual_row = lines.len();
                cursor_visual_col = 0;
            }
            lines.push(Line::from(""));
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0usize;
        let mut char_count = 0usize;

        for (char_idx, ch) in logical.chars().enumerate() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width > width && current_width > 0 {
                lines.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }
            if is_cursor_line && char_idx == cursor_col {
                cursor_visual_row = lines.len();
                cursor_visual_col = current_width;
            }
            current.push(ch);
            current_width += ch_width;
            char_count += 1;
        }

        // Cursor sitting past the last character of this line.
        if is_cursor_line && cursor_col >= char_count {
            cursor_visual_row = lines.len();
            cursor_visual_col = current_width;
        }
        lines.push(Line::from(current));
    }

    if lines.is_empty() {
        lines.push(Line::from(""));
    }

    WrappedEditor {
        lines,
        cursor_row: cursor_visual_row,
        cursor_col: cursor_visual_col,
    }
}

/// Dynamic input height: minimum while the prompt is a single line,
/// growing with content up to 40% of the terminal.
pub fn calculate_input_height(editor: &TextEditor, terminal_height: u16) -> u16 {
    let line_count = editor.line_count() as u16;
    if line_count <= 1 {
        return INPUT_HEIGHT_MIN;
    }

    let max_height = (f32::from(terminal_height) * INPUT_HEIGHT_MAX_PERCENT) as u16;
    let desired = line_count + 2;
    desired.max(INPUT_HEIGHT_MIN).min(max_height)
}

/// Renders the input box with the model name on the top border and
/// session token counts on the right. The terminal cursor is placed
/// only when `show_cursor` is set, so focus can move to the canvas
/// editor without two competing cursors.
pub fn render_input(frame: &mut ratatui::Frame, area: Rect, app: &AppState, show_cursor: bool) {
    let border_style = Style::default().fg(Color::DarkGray);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {} ", app.config.model), border_style));

    if app.chat.input_tokens > 0 || app.chat.output_tokens > 0 {
        let usage = format!(
            " {} in · {} out ",
            format_tokens(app.chat.input_tokens),
            format_tokens(app.chat.output_tokens)
        );
        block = block.title_top(
            Line::from(Span::styled(
                usage,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            ))
            .alignment(Alignment::Right),
        );
    }

    let inner = block.inner(area);
    if inner.width == 0 || inner.height == 0 {
        frame.render_widget(block, area);
        return;
    }

    if app.input.editor.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Ask anything, or /help for commands",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        if show_cursor {
            frame.set_cursor_position((inner.x, inner.y));
        }
        return;
    }

    let wrapped = wrap_editor(&app.input.editor, inner.width as usize);

    // Scroll just far enough to keep the cursor row visible.
    let viewport = inner.height as usize;
    let scroll = if wrapped.cursor_row >= viewport {
        wrapped.cursor_row - viewport + 1
    } else {
        0
    };

    let visible: Vec<Line> = wrapped
        .lines
        .into_iter()
        .skip(scroll)
        .take(viewport)
        .collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);

    let cursor_x = inner.x + wrapped.cursor_col as u16;
    let cursor_y = inner.y + (wrapped.cursor_row - scroll) as u16;
    if show_cursor
        && cursor_x < inner.x + inner.width
        && cursor_y < inner.y + inner.height
    {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn format_tokens(count: u64) -> String {
    if count >= 10_000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}
