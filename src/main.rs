use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod assistant;
mod cli;
mod clipboard;
mod commands;
mod config;
mod export;
mod identity;
mod models;
mod page;
mod session;
mod storage;
mod utils;

use cli::{Cli, Commands};
use config::Config;

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    let config = Config::load(cli.config)?;

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, config).await,
        Commands::Ask(args) => commands::ask::execute(args, config).await,
        Commands::Open(args) => commands::open::execute(args, config).await,
        Commands::History(args) => commands::history::execute(args, config).await,
        Commands::Export(args) => commands::export::execute(args, config).await,
        Commands::Copy(args) => commands::copy::execute(args, config).await,
        Commands::Key(args) => commands::key::execute(args, config).await,
        Commands::Watch(args) => commands::watch::execute(args, config).await,
    }
}
