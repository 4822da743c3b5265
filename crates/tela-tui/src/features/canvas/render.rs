//! Canvas panel view.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tela_core::markdown::extract_longest_code_block;

use super::state::{CanvasPanel, CanvasSource};
use crate::common::text::wrap_text;
use crate::features::input::render::{WrappedEditor, wrap_editor};
use crate::features::transcript::{CellId, HistoryCell, TranscriptState};
use crate::state::AppState;

/// Renders the canvas panel into `area`. Hidden panels render nothing;
/// the caller is expected to skip the layout split in that case anyway.
pub fn render_canvas(frame: &mut ratatui::Frame, area: Rect, app: &mut AppState) {
    match &app.canvas.panel {
        CanvasPanel::Hidden => {}
        CanvasPanel::Live { text, .. } => {
            let text = text.clone();
            render_stream(frame, area, &text);
        }
        CanvasPanel::Generating { buffer } => {
            let text = buffer.clone();
            render_stream(frame, area, &text);
        }
        CanvasPanel::View { source, scroll } => {
            let text = match source {
                CanvasSource::Cell(id) => block_text_from_cell(&app.transcript, *id),
                CanvasSource::Buffer(buffer) => Some(buffer.clone()),
            };
            let scroll = *scroll;
            let applied = render_view(frame, area, text.as_deref(), scroll);
            if let CanvasPanel::View { scroll, .. } = &mut app.canvas.panel {
                *scroll = applied;
            }
        }
        CanvasPanel::Edit { editor, .. } => {
            let title = canvas_title(&editor.text());
            let wrapped = wrap_editor(editor, usable_width(area));
            render_edit(frame, area, &title, wrapped);
        }
    }
}

/// The block currently shown for a cell-backed view, re-read from the
/// transcript so canvas edits and reply rewrites show up immediately.
fn block_text_from_cell(transcript: &TranscriptState, id: CellId) -> Option<String> {
    let HistoryCell::Assistant { content, .. } = transcript.cell(id)? else {
        return None;
    };
    extract_longest_code_block(content).map(|found| found.text.to_string())
}

fn render_stream(frame: &mut ratatui::Frame, area: Rect, text: &str) {
    let block = canvas_block(&canvas_title(text), Color::DarkGray)
        .title_bottom(hint_line(" streaming... "));
    let inner = block.inner(area);
    if inner.width == 0 || inner.height == 0 {
        frame.render_widget(block, area);
        return;
    }

    let lines = styled_code_lines(text, inner.width as usize);

    // Follow the tail while content streams in.
    let skip = lines.len().saturating_sub(inner.height as usize);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}

/// Renders a settled view and returns the clamped scroll offset for
/// the caller to write back.
fn render_view(frame: &mut ratatui::Frame, area: Rect, text: Option<&str>, scroll: u16) -> u16 {
    let Some(text) = text else {
        let block = canvas_block(" canvas ", Color::DarkGray)
            .title_bottom(hint_line(" Ctrl+O close "));
        let message = Paragraph::new(Line::from(Span::styled(
            "The code block is gone.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(message, area);
        return 0;
    };

    let block = canvas_block(&canvas_title(text), Color::DarkGray)
        .title_bottom(hint_line(" Ctrl+E edit · Ctrl+O close "));
    let inner = block.inner(area);
    if inner.width == 0 || inner.height == 0 {
        frame.render_widget(block, area);
        return scroll;
    }

    let lines = styled_code_lines(text, inner.width as usize);
    let max_offset = lines.len().saturating_sub(inner.height as usize) as u16;
    let applied = scroll.min(max_offset);

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(applied as usize)
        .take(inner.height as usize)
        .collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
    applied
}

fn render_edit(frame: &mut ratatui::Frame, area: Rect, title: &str, wrapped: WrappedEditor) {
    let block = canvas_block(title, Color::Yellow)
        .title_bottom(hint_line(" Ctrl+S apply · Esc cancel "));
    let inner = block.inner(area);
    if inner.width == 0 || inner.height == 0 {
        frame.render_widget(block, area);
        return;
    }

    let viewport = inner.height as usize;
    let skip = if wrapped.cursor_row >= viewport {
        wrapped.cursor_row - viewport + 1
    } else {
        0
    };
    let visible: Vec<Line> = wrapped
        .lines
        .into_iter()
        .skip(skip)
        .take(viewport)
        .collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);

    let cursor_x = inner.x + wrapped.cursor_col as u16;
    let cursor_y = inner.y + (wrapped.cursor_row - skip) as u16;
    if cursor_x < inner.x + inner.width && cursor_y < inner.y + inner.height {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// Inner width once the side borders are taken off.
fn usable_width(area: Rect) -> usize {
    area.width.saturating_sub(2) as usize
}

fn canvas_block(title: &str, border: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(border),
        ))
}

fn hint_line(hint: &str) -> Line<'static> {
    Line::from(Span::styled(
        hint.to_string(),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Right)
}

/// " canvas · {language} · {n} lines ", omitting the language when the
/// opening fence has none.
fn canvas_title(text: &str) -> String {
    let count = code_line_count(text);
    let noun = if count == 1 { "line" } else { "lines" };
    match fence_language(text) {
        Some(lang) => format!(" canvas · {lang} · {count} {noun} "),
        None => format!(" canvas · {count} {noun} "),
    }
}

/// Language tag on the opening fence, if any.
fn fence_language(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let lang = rest.lines().next().unwrap_or("").trim();
    if lang.is_empty() { None } else { Some(lang) }
}

/// Lines of code between the fences.
fn code_line_count(text: &str) -> usize {
    text.lines().filter(|l| !l.trim_start().starts_with("```")).count()
}

/// Wraps panel text, dimming fence lines so the code stands out.
fn styled_code_lines(text: &str, width: usize) -> Vec<Line<'static>> {
    let fence_style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM);
    wrap_text(text, width)
        .into_iter()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                Line::from(Span::styled(line, fence_style))
            } else {
                Line::from(line)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_title_includes_language_and_count() {
        assert_eq!(
            canvas_title("```rust\nfn main() {}\nlet x = 1;\n```"),
            " canvas · rust · 2 lines "
        );
        assert_eq!(canvas_title("```\nx\n```"), " canvas · 1 line ");
    }

    #[test]
    fn test_fence_language_trims_and_rejects_empty() {
        assert_eq!(fence_language("```python\nx"), Some("python"));
        assert_eq!(fence_language("``` go \nx"), Some("go"));
        assert_eq!(fence_language("```\nx"), None);
        assert_eq!(fence_language("no fence"), None);
    }

    #[test]
    fn test_code_line_count_skips_fences() {
        assert_eq!(code_line_count("```js\na\nb\n```"), 2);
        assert_eq!(code_line_count("```js\n"), 0);
    }

    #[test]
    fn test_styled_code_lines_dim_fences_only() {
        let lines = styled_code_lines("```rust\nlet x = 1;\n```", 40);
        assert_eq!(lines.len(), 3);
        let fence_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM);
        assert_eq!(lines[0].spans[0].style, fence_style);
        assert_eq!(lines[1].spans[0].style, Style::default());
    }
}
