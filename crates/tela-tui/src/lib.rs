//! Full-screen TUI for tela.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use tela_core::config::Config;

pub use features::{canvas, input, transcript};
pub use runtime::TuiRuntime;

use crate::features::transcript::HistoryCell;

/// Runs the interactive chat loop until the user quits.
pub async fn run_interactive_chat(config: &Config) -> Result<()> {
    // The TUI needs a real terminal to take over.
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Interactive chat needs a terminal.\n\
             Use `tela exec -p '...'` for non-interactive output."
        );
    }

    // Pre-TUI info goes to stderr; the alternate screen replaces it.
    let mut err = stderr();
    writeln!(err, "tela ({})", config.model)?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(config.clone())?;

    let config_path = tela_core::config::paths::config_path();
    if config_path.exists() {
        runtime.app.transcript.push(HistoryCell::notice(format!(
            "Config file: {}",
            config_path.display()
        )));
    }
    runtime
        .app
        .transcript
        .push(HistoryCell::notice("Type /help for commands."));

    runtime.run()?;

    writeln!(stderr(), "Bye.")?;
    Ok(())
}
