//! A small multi-line text editor.
//!
//! Backs both the input box and canvas edit mode. Lines are plain
//! strings; the cursor is a (row, column) pair where the column counts
//! characters, not bytes.

/// Cursor movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
}

/// Character classes for word-wise movement. Runs of the same class
/// form a word, so `foo.bar` stops at the dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn class_of(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

#[derive(Debug, Clone)]
pub struct TextEditor {
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEditor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    /// Creates an editor over existing text with the cursor at the top.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        Self {
            lines,
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Cursor position as (row, column), column in characters.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    /// Replaces the content and puts the cursor at the very end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.cursor_row = self.lines.len() - 1;
        self.cursor_col = self.lines[self.cursor_row].chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
        self.lines[self.cursor_row].insert(byte, c);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
        let tail = self.lines[self.cursor_row].split_off(byte);
        self.lines.insert(self.cursor_row + 1, tail);
        self.cursor_row += 1;
        self.cursor_col = 0;
    }

    /// Inserts text, splitting on newlines. Carriage returns from
    /// terminal pastes are normalized away.
    pub fn insert_str(&mut self, s: &str) {
        let s = s.replace("\r\n", "\n").replace('\r', "\n");
        if !s.contains('\n') {
            let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
            self.lines[self.cursor_row].insert_str(byte, &s);
            self.cursor_col += s.chars().count();
            return;
        }

        let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
        let tail = self.lines[self.cursor_row].split_off(byte);
        let mut parts = s.split('\n');
        if let Some(first) = parts.next() {
            self.lines[self.cursor_row].push_str(first);
        }
        let mut row = self.cursor_row;
        for part in parts {
            row += 1;
            self.lines.insert(row, part.to_string());
        }
        self.cursor_row = row;
        self.cursor_col = self.lines[row].chars().count();
        self.lines[row].push_str(&tail);
    }

    pub fn delete_prev_char(&mut self) {
        if self.cursor_col > 0 {
            let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col - 1);
            self.lines[self.cursor_row].remove(byte);
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            let removed = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = self.lines[self.cursor_row].chars().count();
            self.lines[self.cursor_row].push_str(&removed);
        }
    }

    pub fn delete_next_char(&mut self) {
        let len = self.lines[self.cursor_row].chars().count();
        if self.cursor_col < len {
            let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
            self.lines[self.cursor_row].remove(byte);
        } else if self.cursor_row + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_row + 1);
            self.lines[self.cursor_row].push_str(&next);
        }
    }

    /// Deletes from the cursor to the end of the line; at the end of a
    /// line it joins the next one, emacs style.
    pub fn kill_to_line_end(&mut self) {
        let len = self.lines[self.cursor_row].chars().count();
        if self.cursor_col < len {
            let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
            self.lines[self.cursor_row].truncate(byte);
        } else if self.cursor_row + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_row + 1);
            self.lines[self.cursor_row].push_str(&next);
        }
    }

    pub fn kill_to_line_start(&mut self) {
        let byte = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
        self.lines[self.cursor_row] = self.lines[self.cursor_row][byte..].to_string();
        self.cursor_col = 0;
    }

    pub fn delete_word_left(&mut self) {
        if self.cursor_col == 0 {
            self.delete_prev_char();
            return;
        }
        let chars: Vec<char> = self.lines[self.cursor_row].chars().collect();
        let target = prev_word_col(&chars, self.cursor_col);
        let start = char_to_byte(&self.lines[self.cursor_row], target);
        let end = char_to_byte(&self.lines[self.cursor_row], self.cursor_col);
        self.lines[self.cursor_row].replace_range(start..end, "");
        self.cursor_col = target;
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        match movement {
            CursorMove::Up => {
                if self.cursor_row > 0 {
                    self.cursor_row -= 1;
                    self.clamp_col();
                }
            }
            CursorMove::Down => {
                if self.cursor_row + 1 < self.lines.len() {
                    self.cursor_row += 1;
                    self.clamp_col();
                }
            }
            CursorMove::Left => {
                if self.cursor_col > 0 {
                    self.cursor_col -= 1;
                } else if self.cursor_row > 0 {
                    self.cursor_row -= 1;
                    self.cursor_col = self.lines[self.cursor_row].chars().count();
                }
            }
            CursorMove::Right => {
                let len = self.lines[self.cursor_row].chars().count();
                if self.cursor_col < len {
                    self.cursor_col += 1;
                } else if self.cursor_row + 1 < self.lines.len() {
                    self.cursor_row += 1;
                    self.cursor_col = 0;
                }
            }
            CursorMove::LineStart => self.cursor_col = 0,
            CursorMove::LineEnd => {
                self.cursor_col = self.lines[self.cursor_row].chars().count();
            }
            CursorMove::WordLeft => {
                if self.cursor_col == 0 {
                    self.move_cursor(CursorMove::Left);
                    return;
                }
                let chars: Vec<char> = self.lines[self.cursor_row].chars().collect();
                self.cursor_col = prev_word_col(&chars, self.cursor_col);
            }
            CursorMove::WordRight => {
                let chars: Vec<char> = self.lines[self.cursor_row].chars().collect();
                if self.cursor_col >= chars.len() {
                    self.move_cursor(CursorMove::Right);
                    return;
                }
                self.cursor_col = next_word_col(&chars, self.cursor_col);
            }
        }
    }

    fn clamp_col(&mut self) {
        let len = self.lines[self.cursor_row].chars().count();
        self.cursor_col = self.cursor_col.min(len);
    }
}

/// Column of the start of the word left of `col`.
fn prev_word_col(chars: &[char], col: usize) -> usize {
    let mut i = col.min(chars.len());
    while i > 0 && class_of(chars[i - 1]) == CharClass::Space {
        i -= 1;
    }
    if i == 0 {
        return 0;
    }
    let class = class_of(chars[i - 1]);
    while i > 0 && class_of(chars[i - 1]) == class {
        i -= 1;
    }
    i
}

/// Column just past the word right of `col`, skipping trailing spaces.
fn next_word_col(chars: &[char], col: usize) -> usize {
    let mut i = col;
    let class = class_of(chars[i]);
    while i < chars.len() && class_of(chars[i]) == class {
        i += 1;
    }
    while i < chars.len() && class_of(chars[i]) == CharClass::Space {
        i += 1;
    }
    i
}

/// Byte offset of character index `col` in `line`.
fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> TextEditor {
        let mut ed = TextEditor::new();
        ed.set_text(text);
        ed
    }

    #[test]
    fn test_insert_and_text_round_trip() {
        let mut ed = TextEditor::new();
        ed.insert_char('h');
        ed.insert_char('i');
        assert_eq!(ed.text(), "hi");
        assert_eq!(ed.cursor(), (0, 2));
    }

    #[test]
    fn test_newline_splits_at_cursor() {
        let mut ed = editor_with("hello");
        ed.move_cursor(CursorMove::LineStart);
        ed.move_cursor(CursorMove::Right);
        ed.move_cursor(CursorMove::Right);
        ed.insert_newline();
        assert_eq!(ed.text(), "he\nllo");
        assert_eq!(ed.cursor(), (1, 0));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut ed = editor_with("ab\ncd");
        ed.cursor_row = 1;
        ed.cursor_col = 0;
        ed.delete_prev_char();
        assert_eq!(ed.text(), "abcd");
        assert_eq!(ed.cursor(), (0, 2));
    }

    #[test]
    fn test_delete_at_line_end_joins_next() {
        let mut ed = editor_with("ab\ncd");
        ed.cursor_row = 0;
        ed.move_cursor(CursorMove::LineEnd);
        ed.delete_next_char();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn test_insert_str_multiline_paste() {
        let mut ed = editor_with("start end");
        ed.cursor_col = 6;
        ed.insert_str("one\ntwo");
        assert_eq!(ed.text(), "start one\ntwoend");
        assert_eq!(ed.cursor(), (1, 3));
    }

    #[test]
    fn test_insert_str_normalizes_crlf() {
        let mut ed = TextEditor::new();
        ed.insert_str("a\r\nb\rc");
        assert_eq!(ed.text(), "a\nb\nc");
    }

    #[test]
    fn test_kill_to_line_end_and_start() {
        let mut ed = editor_with("hello world");
        ed.cursor_col = 5;
        ed.kill_to_line_end();
        assert_eq!(ed.text(), "hello");

        ed.kill_to_line_start();
        assert_eq!(ed.text(), "");
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn test_kill_to_line_end_at_eol_joins() {
        let mut ed = editor_with("ab\ncd");
        ed.cursor_row = 0;
        ed.move_cursor(CursorMove::LineEnd);
        ed.kill_to_line_end();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn test_delete_word_left() {
        let mut ed = editor_with("one two three");
        ed.delete_word_left();
        assert_eq!(ed.text(), "one two ");
        ed.delete_word_left();
        assert_eq!(ed.text(), "one ");
    }

    #[test]
    fn test_word_movement_stops_at_punctuation() {
        let mut ed = editor_with("foo.bar/baz");
        ed.move_cursor(CursorMove::LineStart);
        ed.move_cursor(CursorMove::WordRight);
        assert_eq!(ed.cursor(), (0, 3));
        ed.move_cursor(CursorMove::WordRight);
        assert_eq!(ed.cursor(), (0, 4));
        ed.move_cursor(CursorMove::WordRight);
        assert_eq!(ed.cursor(), (0, 7));
    }

    #[test]
    fn test_word_left_skips_trailing_spaces() {
        let mut ed = editor_with("alpha   beta");
        ed.move_cursor(CursorMove::WordLeft);
        assert_eq!(ed.cursor(), (0, 8));
        ed.move_cursor(CursorMove::WordLeft);
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn test_left_right_cross_line_boundaries() {
        let mut ed = editor_with("ab\ncd");
        ed.cursor_row = 1;
        ed.cursor_col = 0;
        ed.move_cursor(CursorMove::Left);
        assert_eq!(ed.cursor(), (0, 2));
        ed.move_cursor(CursorMove::Right);
        assert_eq!(ed.cursor(), (1, 0));
    }

    #[test]
    fn test_up_down_clamp_column() {
        let mut ed = editor_with("long line here\nab");
        assert_eq!(ed.cursor(), (1, 2));
        ed.move_cursor(CursorMove::Up);
        assert_eq!(ed.cursor(), (0, 2));
        ed.cursor_col = 14;
        ed.move_cursor(CursorMove::Down);
        assert_eq!(ed.cursor(), (1, 2));
    }

    #[test]
    fn test_from_text_starts_at_top() {
        let ed = TextEditor::from_text("a\nb\nc");
        assert_eq!(ed.cursor(), (0, 0));
        assert_eq!(ed.line_count(), 3);
    }

    #[test]
    fn test_set_text_puts_cursor_at_end() {
        let ed = editor_with("ab\ncd");
        assert_eq!(ed.cursor(), (1, 2));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ed = editor_with("stuff");
        ed.clear();
        assert!(ed.is_empty());
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn test_multibyte_characters() {
        let mut ed = TextEditor::new();
        ed.insert_str("héllo");
        ed.move_cursor(CursorMove::LineStart);
        ed.move_cursor(CursorMove::Right);
        ed.move_cursor(CursorMove::Right);
        ed.insert_char('x');
        assert_eq!(ed.text(), "héxllo");
    }
}
