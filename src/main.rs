mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use sapledger::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match cli.config.clone() {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Ingest(args) => commands::ingest(&config, args)?,
        Commands::Batch(args) => commands::batch(&config, args)?,
        Commands::Watch(args) => commands::watch(&config, args).await?,
        Commands::Analyze(args) => commands::analyze(&config, args)?,
        Commands::Purge(args) => commands::purge(&config, args)?,
    }

    Ok(())
}
