//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tela_core::config;
use tela_core::core::interrupt;

mod commands;

#[derive(Parser)]
#[command(name = "tela")]
#[command(version)]
#[command(about = "Streaming chat client with a side-by-side code canvas")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Send one prompt and stream the reply to stdout
    Exec {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the models the configured endpoint serves
    Models,

    /// Inspect or edit the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print where the config file lives
    Path,
    /// Write a starter config file if none exists
    Init,
    /// Print a config built from compiled-in defaults
    Generate,
    /// Open the config file in the default editor
    Open,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // Logs go to a file under TELA_HOME; losing them is not fatal.
    let _log_guard = match tela_core::logging::init() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {err:#}");
            None
        }
    };

    // Every subcommand shares this one runtime.
    let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    rt.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;
    tracing::debug!(model = %config.model, api_type = config.api_type.as_str(), "config loaded");

    // Bare `tela` opens the chat TUI.
    let Some(command) = cli.command else {
        return commands::chat::run(&config).await;
    };

    match command {
        Commands::Exec { prompt, model } => {
            commands::exec::run(&prompt, &config, model.as_deref()).await
        }

        Commands::Models => commands::models::list(&config).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::Open => commands::config::open(),
        },
    }
}
