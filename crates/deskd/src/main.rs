//! Desk daemon - support-ticket list and reporting service.
//!
//! Serves the paginated list API, dashboard aggregates, and the
//! tracker webhook over SQLite.

use anyhow::Result;
use clap::Parser;
use desk_common::DeskConfig;
use deskd::server::{self, AppState};
use deskd::store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "deskd", version, about = "Desk daemon")]
struct Args {
    /// Config file path (default: DESK_CONFIG or /etc/desk/config.toml)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DeskConfig::load_from(path),
        None => DeskConfig::load(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    info!("deskd v{} starting", env!("CARGO_PKG_VERSION"));

    let store = Store::open(&config.server.db_path).await?;
    server::run(AppState::new(store, config)).await
}
