use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use chromelogger::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
        },
        cli::Commands::Decode { header } => {
            commands::decode::execute(header)?;
        }
        cli::Commands::Version => {
            println!("chromelogger v{}", env!("CARGO_PKG_VERSION"));
            println!("Protocol version {}", chromelogger::PROTOCOL_VERSION);
        }
    }

    Ok(())
}
