//! Core tela library (markdown detection, provider client, turn runner, config).

pub mod config;
pub mod core;
pub mod logging;
pub mod markdown;
pub mod prompts;
pub mod providers;
