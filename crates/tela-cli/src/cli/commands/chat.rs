//! Chat command handler.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result, ensure};
use tela_core::config;

use super::exec;
use crate::modes;

pub async fn run(config: &config::Config) -> Result<()> {
    // Piped stdin means the caller wants a one-shot answer, not a TUI.
    if !std::io::stdin().is_terminal() {
        let mut piped = String::new();
        std::io::stdin().lock().read_to_string(&mut piped)?;
        let prompt = piped.trim();
        ensure!(!prompt.is_empty(), "No input provided via pipe");
        return exec::run(prompt, config, None).await;
    }

    modes::run_interactive_chat(config)
        .await
        .context("interactive chat failed")?;

    Ok(())
}
