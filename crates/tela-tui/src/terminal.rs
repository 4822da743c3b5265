//! Terminal lifecycle.
//!
//! Raw mode and the alternate screen must be unwound on every exit
//! path: normal quit, panic, and Ctrl+C. `restore_terminal` is
//! idempotent so the panic hook and the interrupt handler can both
//! call it.

use std::io::{self, Stdout};
use std::panic;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Enters raw mode and the alternate screen.
///
/// Call `install_panic_hook` first so a panic during setup still
/// restores the terminal.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enter raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
}

/// Turns on bracketed paste and mouse capture.
///
/// Kept separate from `setup_terminal` so the event loop can pair it
/// with `disable_input_features` on the normal exit path, while
/// `restore_terminal` still cleans both up after a panic.
pub fn enable_input_features() -> Result<()> {
    execute!(io::stdout(), EnableBracketedPaste, EnableMouseCapture)
        .context("enable bracketed paste and mouse capture")?;
    Ok(())
}

pub fn disable_input_features() -> Result<()> {
    execute!(io::stdout(), DisableMouseCapture, DisableBracketedPaste)
        .context("disable bracketed paste and mouse capture")?;
    Ok(())
}

/// Restores the terminal to its pre-TUI state. Safe to call more than
/// once, and from the panic hook.
pub fn restore_terminal() -> Result<()> {
    // Input features must go first, while raw mode is still active.
    let _ = execute!(io::stdout(), DisableMouseCapture, DisableBracketedPaste);
    execute!(io::stdout(), LeaveAlternateScreen).context("leave alternate screen")?;
    disable_raw_mode().context("leave raw mode")?;
    Ok(())
}

/// Chains terminal restore in front of the existing panic hook so the
/// panic message lands on a usable screen.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    // These functions need a real TTY, so there is nothing to assert in
    // CI. Manual checklist: terminal restored after quit, after panic,
    // and after Ctrl+C, with mouse capture and bracketed paste off.
}
