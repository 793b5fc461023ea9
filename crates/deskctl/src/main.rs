//! Desk Control - CLI client for the desk daemon.

use anyhow::Result;
use clap::Parser;
use deskctl::cli::Cli;
use deskctl::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet by default; RUST_LOG=debug surfaces retry diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli).await
}
