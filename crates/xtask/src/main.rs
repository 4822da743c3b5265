use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Tela maintainer tasks")]
struct Cli {
    #[command(subcommand)]
    task: Option<Task>,
}

#[derive(Debug, Default, Subcommand)]
enum Task {
    /// Update default_config.toml by running `tela config generate`.
    #[default]
    UpdateDefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.task.unwrap_or_default() {
        Task::UpdateDefaultConfig => update_default_config(),
    }
}

/// Regenerates the embedded config template from `Config::default()`,
/// keeping file defaults and Rust defaults from drifting apart.
fn update_default_config() -> Result<()> {
    let root = project_root()?;

    let generate = Command::new("cargo")
        .current_dir(&root)
        .args(["run", "-p", "tela", "--", "config", "generate"])
        .output()
        .context("invoke `cargo run -p tela -- config generate`")?;
    if !generate.status.success() {
        bail!(
            "config generate failed:\n{}",
            String::from_utf8_lossy(&generate.stderr)
        );
    }

    let dest = root.join("crates/tela-core/default_config.toml");
    fs::write(&dest, &generate.stdout).with_context(|| format!("write {}", dest.display()))?;

    println!("Wrote {}", dest.display());
    Ok(())
}

// CARGO_MANIFEST_DIR is crates/xtask, so the workspace root is two levels up.
fn project_root() -> Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(Path::parent)
        .context("xtask manifest dir has no grandparent")?;
    Ok(root.to_path_buf())
}
