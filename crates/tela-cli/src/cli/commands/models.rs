//! Models command handler.

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use tela_core::config;
use tela_core::providers::ChatClient;

pub async fn list(config: &config::Config) -> Result<()> {
    let client = ChatClient::from_config(config)?;
    let models = client.list_models().await.context("list models")?;

    if models.is_empty() {
        println!("The endpoint reported no models.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "OWNED BY"]);
    for model in &models {
        table.add_row([model.id.as_str(), model.owned_by.as_deref().unwrap_or("-")]);
    }

    println!("{table}");
    Ok(())
}
