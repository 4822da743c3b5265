//! Scrollbar widget with a stable thumb size.
//!
//! ratatui's built-in scrollbar rounds the thumb's start and end
//! separately, so the thumb grows and shrinks while scrolling. This one
//! computes a fixed thumb length and positions it from the offset.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

const THUMB_SYMBOL: &str = "█";
const TRACK_SYMBOL: &str = "│";

/// Vertical scrollbar for bottom-anchored content.
///
/// The offset is measured from the bottom, matching the transcript's
/// scroll model: zero means following the newest lines, growing as the
/// user scrolls back.
#[derive(Debug, Clone)]
pub struct Scrollbar {
    total_lines: usize,
    viewport_height: usize,
    offset_from_bottom: usize,
}

impl Scrollbar {
    pub fn new(total_lines: usize, viewport_height: usize, offset_from_bottom: usize) -> Self {
        Self {
            total_lines,
            viewport_height,
            offset_from_bottom,
        }
    }

    fn should_display(&self) -> bool {
        self.total_lines > self.viewport_height
    }
}

impl Widget for Scrollbar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.should_display() {
            return;
        }

        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        let track_len = area.height as usize;
        let viewport_len = self.viewport_height.min(track_len);
        if track_len == 0 || max_scroll == 0 {
            return;
        }

        // Distance from the top, which is what the track position needs.
        let scroll_offset = max_scroll.saturating_sub(self.offset_from_bottom.min(max_scroll));

        // Fixed thumb length: round(track * viewport / (total - 1 + viewport)).
        let span = self.total_lines - 1 + viewport_len;
        let thumb_len = if span == 0 {
            track_len
        } else {
            let rounded =
                (track_len as u64 * viewport_len as u64 + span as u64 / 2) / span as u64;
            (rounded as usize).clamp(1, track_len)
        };

        // The thumb touches the bottom exactly at full scroll.
        let slack = track_len.saturating_sub(thumb_len);
        let thumb_start = ((scroll_offset as u64 * slack as u64) / max_scroll as u64) as usize;
        let thumb_rows = thumb_start..thumb_start + thumb_len;

        let style = Style::default().fg(Color::DarkGray);
        let col = area.x + area.width.saturating_sub(1);
        for row in 0..track_len {
            let symbol = if thumb_rows.contains(&row) {
                THUMB_SYMBOL
            } else {
                TRACK_SYMBOL
            };
            buf.set_string(col, area.y + row as u16, symbol, style);
        }
    }
}
