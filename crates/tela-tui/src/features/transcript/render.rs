//! Transcript view: cells to renderable lines.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use tela_core::markdown::contains_markdown;

use super::cell::HistoryCell;
use super::markdown::markdown_lines;
use super::style::{StyledLine, TextStyle};
use crate::common::text::{sanitize_for_display, wrap_text};

/// Block cursor shown at the tail of a streaming reply.
const STREAM_CURSOR: &str = "▌";

/// Builds the full transcript as wrapped terminal lines.
///
/// Cells are separated by one blank line. `width` is the usable text
/// width; the caller accounts for margins and scrollbar.
pub fn build_transcript_lines(cells: &[HistoryCell], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for cell in cells {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        render_cell(cell, width, &mut lines);
    }
    lines
}

fn render_cell(cell: &HistoryCell, width: usize, lines: &mut Vec<Line<'static>>) {
    match cell {
        HistoryCell::User { content, .. } => {
            let text = sanitize_for_display(content);
            let body_width = width.saturating_sub(2);
            for (i, row) in wrap_text(&text, body_width).into_iter().enumerate() {
                let prefix = if i == 0 { "> " } else { "  " };
                lines.push(Line::from(vec![
                    Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                    Span::styled(row, Style::default().add_modifier(Modifier::BOLD)),
                ]));
            }
        }
        HistoryCell::Assistant {
            content,
            is_streaming,
            is_interrupted,
            ..
        } => {
            let text = sanitize_for_display(content);
            if !*is_streaming && contains_markdown(&text) {
                for styled in markdown_lines(&text) {
                    lines.extend(wrap_styled_line(&styled, width));
                }
            } else {
                for row in wrap_text(&text, width) {
                    lines.push(Line::from(row));
                }
            }
            if *is_streaming {
                append_cursor(lines, content.is_empty());
            }
            if *is_interrupted {
                lines.push(Line::from(Span::styled(
                    "(interrupted)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        HistoryCell::Notice { content, created_at, .. } => {
            let stamp = created_at.with_timezone(&chrono::Local).format("%H:%M");
            let mut first = true;
            for row in wrap_text(&sanitize_for_display(content), width.saturating_sub(6)) {
                let prefix = if first {
                    format!("{stamp} ")
                } else {
                    "      ".to_string()
                };
                first = false;
                lines.push(Line::from(vec![
                    Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                    Span::styled(row, Style::default().fg(Color::DarkGray)),
                ]));
            }
        }
        HistoryCell::Error { message, created_at, .. } => {
            let stamp = created_at.with_timezone(&chrono::Local).format("%H:%M");
            let mut first = true;
            for row in wrap_text(&sanitize_for_display(message), width.saturating_sub(6)) {
                let prefix = if first {
                    format!("{stamp} ")
                } else {
                    "      ".to_string()
                };
                first = false;
                lines.push(Line::from(vec![
                    Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                    Span::styled(row, Style::default().fg(Color::Red)),
                ]));
            }
        }
    }
}

/// Appends the streaming cursor to the last content line.
fn append_cursor(lines: &mut Vec<Line<'static>>, content_is_empty: bool) {
    let cursor = Span::styled(STREAM_CURSOR, Style::default().fg(Color::Cyan));
    if content_is_empty {
        // Wrapping empty content leaves one blank line; take its place.
        if let Some(last) = lines.last_mut() {
            if last.spans.iter().all(|s| s.content.is_empty()) {
                *last = Line::from(cursor);
                return;
            }
        }
    }
    if let Some(last) = lines.last_mut() {
        last.spans.push(cursor);
    } else {
        lines.push(Line::from(cursor));
    }
}

/// Maps a semantic style to terminal colors.
fn convert_style(style: TextStyle) -> Style {
    match style {
        TextStyle::Plain => Style::default(),
        TextStyle::Muted | TextStyle::CodeFence => Style::default().fg(Color::DarkGray),
        TextStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        TextStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::Heading1 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        TextStyle::Heading2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        TextStyle::Heading3 => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::CodeInline | TextStyle::CodeBlock => Style::default().fg(Color::LightGreen),
        TextStyle::BlockQuote => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        TextStyle::ListMarker => Style::default().fg(Color::Yellow),
        TextStyle::Link => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
    }
}

/// Wraps one styled line to `width` columns, preserving span styles.
///
/// Breaks at space runs between words; a word wider than the line is
/// broken at grapheme boundaries. Spaces at a break point are consumed.
pub fn wrap_styled_line(line: &StyledLine, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        let spans: Vec<Span<'static>> = line
            .spans
            .iter()
            .map(|s| Span::styled(s.text.clone(), convert_style(s.style)))
            .collect();
        return vec![Line::from(spans)];
    }

    let mut out: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    for styled in &line.spans {
        let style = convert_style(styled.style);
        for token in space_runs(&styled.text) {
            let token_width = UnicodeWidthStr::width(token);
            if current_width + token_width <= width {
                push_piece(&mut current, token, style);
                current_width += token_width;
                continue;
            }
            if token.starts_with(' ') {
                // Spaces at the wrap point vanish.
                if !current.is_empty() {
                    out.push(Line::from(std::mem::take(&mut current)));
                    current_width = 0;
                }
                continue;
            }
            if token_width <= width {
                out.push(Line::from(std::mem::take(&mut current)));
                current_width = token_width;
                push_piece(&mut current, token, style);
                continue;
            }
            for grapheme in token.graphemes(true) {
                let g_width = UnicodeWidthStr::width(grapheme);
                if current_width + g_width > width && !current.is_empty() {
                    out.push(Line::from(std::mem::take(&mut current)));
                    current_width = 0;
                }
                push_piece(&mut current, grapheme, style);
                current_width += g_width;
            }
        }
    }
    out.push(Line::from(current));
    out
}

/// Splits text into alternating runs of spaces and non-spaces.
fn space_runs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_is_space: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let is_space = ch == ' ';
        if prev_is_space.is_some_and(|prev| prev != is_space) {
            out.push(&text[start..i]);
            start = i;
        }
        prev_is_space = Some(is_space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Appends text to the span list, merging with the last span when the
/// style matches.
fn push_piece(spans: &mut Vec<Span<'static>>, text: &str, style: Style) {
    if let Some(last) = spans.last_mut() {
        if last.style == style {
            last.content.to_mut().push_str(text);
            return;
        }
    }
    spans.push(Span::styled(text.to_string(), style));
}
