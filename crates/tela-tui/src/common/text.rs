//! Text helpers shared across the TUI.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates `text` to `max_width` display columns, appending an ellipsis
/// when truncation happens.
///
/// Width is measured in terminal columns, so CJK and emoji count as two.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        // Reserve one column for the ellipsis itself.
        if width + ch_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('…');
    result
}

/// Makes a string safe to draw in a terminal cell grid.
///
/// Escape bytes would otherwise be interpreted by the terminal, and raw
/// tabs confuse ratatui's width accounting. Newlines are preserved.
pub fn sanitize_for_display(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .chars()
        .any(|c| c != '\n' && (c.is_control() || c == '\u{7f}'));
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            c if c.is_control() || c == '\u{7f}' => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Wraps `text` to `width` display columns.
///
/// Wrapping is word-based with a hard break for words wider than the
/// line. Input newlines are respected, and leading spaces survive so
/// indented code keeps its shape. A `width` of zero disables wrapping.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }
    let mut out = Vec::new();
    for line in text.split('\n') {
        wrap_line(line, width, &mut out);
    }
    out
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if UnicodeWidthStr::width(line) <= width {
        out.push(line.to_string());
        return;
    }

    let mut current = String::new();
    let mut current_width = 0usize;
    // True until a word lands on the current visual line. The separator
    // space before a word is dropped when the word starts a fresh line.
    let mut fresh = true;

    // Splitting on ' ' yields empty words between consecutive spaces,
    // which keeps runs of spaces (and indentation) intact.
    for (i, word) in line.split(' ').enumerate() {
        let word_width = UnicodeWidthStr::width(word);

        if !fresh {
            let sep = usize::from(i > 0);
            if current_width + sep + word_width <= width {
                if i > 0 {
                    current.push(' ');
                    current_width += 1;
                }
                current.push_str(word);
                current_width += word_width;
                continue;
            }
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width += word_width;
        } else {
            hard_break(word, width, &mut current, &mut current_width, out);
        }
        fresh = false;
    }
    out.push(current);
}

/// Breaks a single over-wide word at grapheme boundaries.
fn hard_break(
    word: &str,
    width: usize,
    current: &mut String,
    current_width: &mut usize,
    out: &mut Vec<String>,
) {
    for grapheme in word.graphemes(true) {
        let g_width = UnicodeWidthStr::width(grapheme);
        if *current_width + g_width > width && !current.is_empty() {
            out.push(std::mem::take(current));
            *current_width = 0;
        }
        current.push_str(grapheme);
        *current_width += g_width;
    }
}
