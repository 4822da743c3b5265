//! Canvas panel state.
//!
//! The canvas mirrors one code block at a time. While a reply streams
//! it tracks the unterminated fence in the transcript; for `/canvas`
//! turns it owns the generated buffer outright; once settled it views
//! (and can edit) the longest completed block.

use crate::features::input::TextEditor;
use crate::features::transcript::CellId;

/// Where the displayed block lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasSource {
    /// Inside a transcript assistant cell; the block is re-derived from
    /// the cell's current content whenever it is needed.
    Cell(CellId),
    /// A buffer the canvas owns, produced by a `/canvas` turn.
    Buffer(String),
}

#[derive(Debug, Default)]
pub enum CanvasPanel {
    #[default]
    Hidden,
    /// Live view of an unterminated fence in a streaming reply. `text`
    /// is the last detected block and is replaced wholesale on every
    /// refresh.
    Live { cell_id: CellId, text: String },
    /// `/canvas` phase one streaming straight into the panel.
    Generating { buffer: String },
    /// A settled block.
    View { source: CanvasSource, scroll: u16 },
    /// The block text under edit; applied back on save only.
    Edit {
        source: CanvasSource,
        editor: TextEditor,
    },
}

#[derive(Debug, Default)]
pub struct CanvasState {
    pub panel: CanvasPanel,
    /// Transcript notice shown while `/canvas` code is generating,
    /// removed once the code lands.
    generating_notice: Option<CellId>,
}

impl CanvasState {
    pub fn is_visible(&self) -> bool {
        !matches!(self.panel, CanvasPanel::Hidden)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.panel, CanvasPanel::Edit { .. })
    }

    pub fn set_generating_notice(&mut self, id: CellId) {
        self.generating_notice = Some(id);
    }

    pub fn take_generating_notice(&mut self) -> Option<CellId> {
        self.generating_notice.take()
    }
}
