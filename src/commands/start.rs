use anyhow::Result;
use chromelogger::{config, server};
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads configuration and serves until a shutdown signal arrives
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting chromelogger demo server...".green());

    let cfg = config::load_config(config_path)?;
    info!(config = %config_path.display(), "Configuration loaded");

    server::start_server(cfg).await?;

    Ok(())
}
