// src/main.rs

//! The entry point: parses CLI flags into a `Config`, sets up logging, and
//! runs the server until shutdown or a fatal startup error.

use anyhow::Result;
use clap::Parser;
use respdb::config::{Cli, Config};
use respdb::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::try_from(cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .compact()
        .init();

    if let Err(e) = server::run(config).await {
        tracing::error!("fatal startup error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
