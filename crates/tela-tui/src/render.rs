//! Frame composition.
//!
//! Pure layout and drawing over `AppState`. The only writes back into
//! state are scroll clamps, once the wrapped line counts are known.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::Scrollbar;
use crate::features::canvas::{self, CanvasPanel};
use crate::features::input::render as input_render;
use crate::features::transcript::render::build_transcript_lines;
use crate::state::{AgentState, AppState};

/// Height of the status line below the input.
const STATUS_HEIGHT: u16 = 1;

/// Max queued prompts shown in the queue panel.
const QUEUE_MAX_ITEMS: usize = 3;

/// Transcript horizontal margin (padding on each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Column reserved for the scrollbar on the right edge.
const SCROLLBAR_WIDTH: u16 = 1;

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Ticks per spinner frame, slowing the animation to a readable pace.
const SPINNER_SPEED_DIVISOR: u64 = 2;

/// Renders the whole frame: transcript (with the canvas beside it when
/// open), queued prompts, input box, status line.
pub fn render(frame: &mut Frame, app: &mut AppState) {
    let area = frame.area();

    let input_height = input_render::calculate_input_height(&app.input.editor, area.height);
    let queue_height = queue_panel_height(app);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(queue_height),
            Constraint::Length(input_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    // The canvas takes the right half of the transcript row.
    let (transcript_area, canvas_area) = if app.canvas.is_visible() {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);
        (halves[0], Some(halves[1]))
    } else {
        (chunks[0], None)
    };

    render_transcript(frame, transcript_area, app);
    if let Some(canvas_area) = canvas_area {
        canvas::render::render_canvas(frame, canvas_area, app);
    }

    if queue_height > 0 {
        render_queue_panel(frame, chunks[1], app);
    }

    input_render::render_input(frame, chunks[2], app, !app.canvas.is_editing());
    render_status_line(frame, chunks[3], app);
}

/// Renders the wrapped, bottom-aligned transcript with its scrollbar.
fn render_transcript(frame: &mut Frame, area: Rect, app: &mut AppState) {
    let width = area
        .width
        .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH) as usize;
    let height = area.height as usize;

    // Lines come pre-wrapped; a Paragraph wrap here would double-wrap.
    let all_lines = build_transcript_lines(app.transcript.cells(), width);
    let total = all_lines.len();
    let max_offset = total.saturating_sub(height);
    app.transcript.scroll.clamp(max_offset);
    let offset = app.transcript.scroll.offset_from_bottom();

    let end = total - offset.min(max_offset);
    let start = end.saturating_sub(height);
    let content: Vec<Line<'static>> = all_lines
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect();

    // Bottom-align: pad at the top when content does not fill the pane.
    let visible: Vec<Line<'static>> = if content.len() < height {
        let mut padded = vec![Line::default(); height - content.len()];
        padded.extend(content);
        padded
    } else {
        content
    };

    let text_area = Rect {
        x: area.x + TRANSCRIPT_MARGIN,
        y: area.y,
        width: area
            .width
            .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH),
        height: area.height,
    };
    frame.render_widget(Paragraph::new(visible), text_area);
    frame.render_widget(Scrollbar::new(total, height, offset), area);
}

fn queue_panel_height(app: &AppState) -> u16 {
    if app.input.has_queued() {
        app.input.queued_count().min(QUEUE_MAX_ITEMS) as u16 + 2
    } else {
        0
    }
}

/// Prompts waiting for the current turn, shown between transcript and
/// input.
fn render_queue_panel(frame: &mut Frame, area: Rect, app: &AppState) {
    if area.height == 0 {
        return;
    }

    // Borders take 2 columns, the bullet prefix another 2.
    let inner_width = area.width.saturating_sub(4) as usize;
    let bullet_style = Style::default().fg(Color::DarkGray);
    let text_style = Style::default().fg(Color::Gray);

    let lines: Vec<Line<'static>> = app
        .input
        .queued_summaries(inner_width)
        .into_iter()
        .take(QUEUE_MAX_ITEMS)
        .map(|summary| {
            Line::from(vec![
                Span::styled("- ", bullet_style),
                Span::styled(summary, text_style),
            ])
        })
        .collect();

    let title = format!(" Queued ({}) ", app.input.queued_count());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(bullet_style)
        .title(Line::from(Span::styled(title, bullet_style)));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_line(frame: &mut Frame, area: Rect, app: &AppState) {
    let spinner_idx = ((app.spinner_frame / SPINNER_SPEED_DIVISOR)
        % SPINNER_FRAMES.len() as u64) as usize;
    let spinner = SPINNER_FRAMES[spinner_idx];
    let elapsed = app
        .turn_started_at
        .map(|started| format!(" ({})", format_elapsed(started.elapsed())));

    let spans: Vec<Span<'static>> = match &app.agent {
        AgentState::Idle => {
            let key_style = Style::default().fg(Color::DarkGray);
            vec![
                Span::styled("Enter", key_style),
                Span::raw(" send  "),
                Span::styled("Alt+Enter", key_style),
                Span::raw(" newline  "),
                Span::styled("/help", key_style),
                Span::raw(" commands  "),
                Span::styled("Ctrl+C", key_style),
                Span::raw(" quit"),
            ]
        }
        AgentState::Waiting { .. } => running_spans(spinner, "Waiting...", Color::Yellow, elapsed),
        AgentState::Streaming { .. } => {
            let label = if matches!(app.canvas.panel, CanvasPanel::Generating { .. }) {
                "Streaming code..."
            } else {
                "Streaming..."
            };
            running_spans(spinner, label, Color::Cyan, elapsed)
        }
    };

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn running_spans(
    spinner: &str,
    label: &str,
    color: Color,
    elapsed: Option<String>,
) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled(spinner.to_string(), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(label.to_string(), Style::default().fg(color)),
    ];
    if let Some(elapsed) = elapsed {
        spans.push(Span::styled(elapsed, Style::default().fg(Color::DarkGray)));
    }
    spans.extend([
        Span::raw("  "),
        Span::styled("Esc", Style::default().fg(Color::DarkGray)),
        Span::raw(" to cancel"),
    ]);
    spans
}

fn format_elapsed(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Rows available to the transcript at the given terminal height.
///
/// Keeps the layout arithmetic in one place so the reducer can size
/// scroll pages without re-deriving chrome heights.
pub fn transcript_viewport_height(app: &AppState, terminal_height: u16) -> u16 {
    let input_height = input_render::calculate_input_height(&app.input.editor, terminal_height);
    terminal_height.saturating_sub(input_height + STATUS_HEIGHT + queue_panel_height(app))
}
