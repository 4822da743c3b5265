//! Exec command handler.

use anyhow::{Context, Result};
use tela_core::config;

use crate::modes;

pub async fn run(
    prompt: &str,
    config: &config::Config,
    model_override: Option<&str>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(model) = model_override {
        config.model = model.to_string();
    }

    // The reply streams straight to stdout; run_exec adds the final newline.
    modes::exec::run_exec(prompt, &config)
        .await
        .context("stream response")?;

    Ok(())
}
