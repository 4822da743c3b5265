//! Input state: the editor plus prompt history and the pending queue.

use std::collections::VecDeque;

use super::editor::TextEditor;
use crate::common::text::truncate_with_ellipsis;

#[derive(Debug, Default)]
pub struct InputState {
    pub editor: TextEditor,
    /// Submitted prompts, oldest first.
    history: Vec<String>,
    /// Position while walking history with Up/Down, newest-relative.
    history_index: Option<usize>,
    /// Unsubmitted text stashed when history navigation starts.
    draft: Option<String>,
    /// Prompts submitted while a turn was still running.
    queued: VecDeque<String>,
}

impl InputState {
    pub fn text(&self) -> String {
        self.editor.text()
    }

    pub fn is_empty(&self) -> bool {
        self.editor.is_empty()
    }

    pub fn clear(&mut self) {
        self.editor.clear();
        self.reset_navigation();
    }

    /// Records a submitted prompt, skipping immediate duplicates.
    pub fn push_history(&mut self, prompt: &str) {
        if self.history.last().is_some_and(|last| last == prompt) {
            return;
        }
        self.history.push(prompt.to_string());
    }

    pub fn reset_navigation(&mut self) {
        self.history_index = None;
        self.draft = None;
    }

    /// Steps back through history if the cursor position allows it.
    /// Returns false when the caller should move the cursor instead.
    pub fn try_history_up(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let (row, _) = self.editor.cursor();
        let navigating = self.history_index.is_some();
        if !navigating && !(self.editor.is_empty() || row == 0) {
            return false;
        }

        let next = match self.history_index {
            None => {
                self.draft = Some(self.editor.text());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(next);
        self.editor.set_text(&self.history[next]);
        true
    }

    /// Steps forward through history, restoring the stashed draft when
    /// walking past the newest entry.
    pub fn try_history_down(&mut self) -> bool {
        let Some(index) = self.history_index else {
            return false;
        };
        let (row, _) = self.editor.cursor();
        if row + 1 < self.editor.line_count() {
            return false;
        }

        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.editor.set_text(&self.history[index + 1]);
        } else {
            let draft = self.draft.take().unwrap_or_default();
            self.history_index = None;
            self.editor.set_text(&draft);
        }
        true
    }

    pub fn enqueue_prompt(&mut self, prompt: String) {
        self.queued.push_back(prompt);
    }

    pub fn pop_queued_prompt(&mut self) -> Option<String> {
        self.queued.pop_front()
    }

    pub fn has_queued(&self) -> bool {
        !self.queued.is_empty()
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    /// First line of each queued prompt, shortened for display.
    pub fn queued_summaries(&self, max_width: usize) -> Vec<String> {
        self.queued
            .iter()
            .map(|p| {
                let first_line = p.lines().next().unwrap_or_default();
                truncate_with_ellipsis(first_line, max_width)
            })
            .collect()
    }
}
