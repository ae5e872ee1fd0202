use anyhow::Result;
use chromelogger::{config, guard::MAX_HEADER_BYTES, HEADER_NAME, PROTOCOL_VERSION};
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the test command
///
/// This validates the configuration file without starting the server
pub fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Testing configuration...".yellow());
    info!("Loading and validating configuration");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration test successful".green());
    println!();

    println!("{}", "Configuration Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!(
        "  {}: {}",
        "Backtraces".cyan(),
        if cfg.logger.backtraces {
            "enabled".green()
        } else {
            "disabled".red()
        }
    );
    println!(
        "  {}: {}",
        "Metrics".cyan(),
        if cfg.metrics.enabled {
            cfg.metrics.endpoint.as_str().green()
        } else {
            "disabled".red()
        }
    );
    println!();

    println!("{}", "Protocol:".cyan());
    println!("    Header: {}", HEADER_NAME);
    println!("    Version: {}", PROTOCOL_VERSION);
    println!("    Size ceiling: {} bytes", MAX_HEADER_BYTES);

    Ok(())
}
