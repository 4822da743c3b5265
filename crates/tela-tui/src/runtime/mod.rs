//! TUI runtime: owns the terminal, runs the event loop, executes
//! effects.
//!
//! This is the boundary where side effects live. The reducer stays
//! pure; everything it wants done comes back as a `UiEffect` and is
//! executed here.

mod handlers;

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tela_core::config::{Config, paths};
use tela_core::core::interrupt;
use tokio::sync::mpsc::error::TryRecvError;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::transcript::HistoryCell;
use crate::state::{AgentState, AppState};
use crate::{render, terminal, update};

/// Tick cadence while a turn is streaming (~60fps).
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Tick cadence when nothing is running; keeps idle CPU low.
const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop, on
/// panic, and on a forced Ctrl+C exit.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub app: AppState,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Sets up the terminal and builds the runtime.
    ///
    /// The panic hook and the Ctrl+C restore hook are installed before
    /// the alternate screen is entered, so a failure mid-setup still
    /// leaves a usable terminal.
    pub fn new(config: Config) -> Result<Self> {
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        interrupt::reset();

        let terminal = terminal::setup_terminal().context("Failed to set up terminal")?;
        Ok(Self {
            terminal,
            app: AppState::new(config),
            last_tick: Instant::now(),
        })
    }

    /// Runs the event loop until quit.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.app.should_quit {
            // Ctrl+C with no turn running means quit. With one running
            // the turn owns the interrupt; it answers with an
            // Interrupted event that resets the flag.
            if interrupt::is_interrupted() && !self.app.agent.is_running() {
                break;
            }

            let mut events = self.collect_events()?;

            // Frame goes first so layout state is current before keys
            // and chat events are reduced.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                dirty |= !matches!(event, UiEvent::Frame { .. });
                let effects = update::update(&mut self.app, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| render::render(frame, &mut self.app))?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects pending chat events, terminal input, and the tick.
    ///
    /// Blocks in the terminal poll until the next tick is due, so input
    /// stays responsive while idle iterations stay cheap.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.app.agent.is_running() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_chat_events(&mut events);

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            push_terminal_event(&mut events, event::read()?);
            // Drain whatever else is buffered without blocking.
            while event::poll(Duration::ZERO)? {
                push_terminal_event(&mut events, event::read()?);
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    /// Drains the running turn's event channel.
    fn collect_chat_events(&mut self, events: &mut Vec<UiEvent>) {
        while let AgentState::Waiting { rx } | AgentState::Streaming { rx, .. } =
            &mut self.app.agent
        {
            match rx.try_recv() {
                Ok(event) => events.push(UiEvent::Chat(event)),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.app, event);
        self.execute_effects(effects);
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.app.should_quit = true;
            }
            UiEffect::StartTurn => self.start_turn(false),
            UiEffect::StartCanvasTurn => self.start_turn(true),
            UiEffect::InterruptTurn => {
                handlers::interrupt_turn(&self.app);
            }
            UiEffect::CopyToClipboard { text } => {
                let notice = match copy_to_clipboard(&text) {
                    Ok(()) => "Copied to clipboard.".to_string(),
                    Err(err) => format!("Clipboard error: {err}"),
                };
                self.app.transcript.push(HistoryCell::notice(notice));
            }
            UiEffect::OpenConfig => {
                let path = paths::config_path();
                let notice = if path.exists() {
                    match open::that(&path) {
                        Ok(()) => format!("Opened {}", path.display()),
                        Err(err) => format!("Could not open {}: {err}", path.display()),
                    }
                } else {
                    "No config file yet. Run `tela config init` to create one.".to_string()
                };
                self.app.transcript.push(HistoryCell::notice(notice));
            }
        }
    }

    fn start_turn(&mut self, canvas_mode: bool) {
        match handlers::spawn_turn(&self.app, canvas_mode) {
            Ok(event) => self.dispatch_event(event),
            Err(err) => {
                // The generating notice would hang around forever.
                if let Some(id) = self.app.canvas.take_generating_notice() {
                    self.app.transcript.remove_cell(id);
                }
                self.app
                    .transcript
                    .push(HistoryCell::error(format!("Failed to start turn: {err:#}")));
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}

/// Maps a crossterm event into the reducer's vocabulary. Resize needs
/// no event of its own: every loop iteration leads with a fresh Frame.
fn push_terminal_event(events: &mut Vec<UiEvent>, event: Event) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => events.push(UiEvent::Key(key)),
        Event::Mouse(mouse) => events.push(UiEvent::Mouse(mouse)),
        Event::Paste(text) => events.push(UiEvent::Paste(text)),
        _ => {}
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}
