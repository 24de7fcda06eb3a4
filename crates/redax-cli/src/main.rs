mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use redax_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Rules { json } => commands::rules::handle(json),
        cli::Commands::Status { converter, json } => {
            let config = commands::with_overrides(&config, converter, None);
            commands::status::handle(&config, json).await
        }
        cli::Commands::Run(args) => commands::run::handle(args, &config).await,
        cli::Commands::Config { path } => {
            commands::config::handle(&config, cli.config.as_deref(), path)
        }
    }
}
