//! Transcript state: the cell list and its scroll position.

use super::cell::{CellId, HistoryCell};

/// Scroll position over the wrapped transcript.
///
/// Position is tracked as a distance from the bottom so that new lines
/// arriving while scrolled up do not shift the view, and an offset of
/// zero naturally follows the stream.
#[derive(Debug, Default)]
pub struct ScrollState {
    offset_from_bottom: usize,
    /// Transcript viewport height from the last frame, for paging.
    page_size: usize,
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        self.offset_from_bottom == 0
    }

    pub fn offset_from_bottom(&self) -> usize {
        self.offset_from_bottom
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_size.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_size.max(1));
    }

    pub fn to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }

    pub fn set_page_size(&mut self, lines: usize) {
        self.page_size = lines;
    }

    /// Clamps the offset to what the current content allows. Called by
    /// the view once the wrapped line count is known.
    pub fn clamp(&mut self, max_offset: usize) {
        self.offset_from_bottom = self.offset_from_bottom.min(max_offset);
    }
}

/// The transcript: an append-mostly list of cells.
#[derive(Debug, Default)]
pub struct TranscriptState {
    cells: Vec<HistoryCell>,
    pub scroll: ScrollState,
}

impl TranscriptState {
    pub fn cells(&self) -> &[HistoryCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn push(&mut self, cell: HistoryCell) -> CellId {
        let id = cell.id();
        self.cells.push(cell);
        id
    }

    pub fn cell(&self, id: CellId) -> Option<&HistoryCell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut HistoryCell> {
        self.cells.iter_mut().find(|c| c.id() == id)
    }

    pub fn remove_cell(&mut self, id: CellId) {
        self.cells.retain(|c| c.id() != id);
    }

    /// The most recent assistant cell, streaming or not.
    pub fn last_assistant(&self) -> Option<&HistoryCell> {
        self.cells
            .iter()
            .rev()
            .find(|c| matches!(c, HistoryCell::Assistant { .. }))
    }

    /// Content of the most recent assistant cell.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.last_assistant().map(|c| match c {
            HistoryCell::Assistant { content, .. } => content.as_str(),
            other => unreachable!("last_assistant returned {other:?}"),
        })
    }

    /// Drops every cell after the most recent user cell. Returns false
    /// when there is no user cell to anchor on.
    pub fn truncate_after_last_user(&mut self) -> bool {
        let Some(pos) = self
            .cells
            .iter()
            .rposition(|c| matches!(c, HistoryCell::User { .. }))
        else {
            return false;
        };
        self.cells.truncate(pos + 1);
        true
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.scroll.to_bottom();
    }
}
