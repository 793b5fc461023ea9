//! Command execution: wire the CLI to the client and loader.

use crate::cli::{Cli, Commands};
use crate::client::DeskClient;
use crate::loader::{Keyed, Loader, Phase};
use crate::render;
use crate::retry::{FetchError, RetryPolicy};
use anyhow::{anyhow, bail, Result};
use desk_common::{DeskConfig, Page, TicketFilter};
use serde::Serialize;
use std::future::Future;

const PAGE_SIZE: u64 = 25;

const DEFAULT_SERVER: &str = "http://127.0.0.1:7810";

/// Flag, then environment, then default.
fn resolve_server(cli: &Cli) -> String {
    cli.server
        .clone()
        .or_else(|| std::env::var("DESK_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}

fn resolve_token(cli: &Cli) -> Option<String> {
    cli.token
        .clone()
        .or_else(|| std::env::var("DESK_TOKEN").ok())
        .filter(|t| !t.is_empty())
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = DeskConfig::load();
    let policy = RetryPolicy::from_config(&config.retry);

    let server = resolve_server(&cli);
    let token = resolve_token(&cli);
    let client = DeskClient::new(&server, token.as_deref().unwrap_or(""), policy)?;

    match cli.command {
        Commands::Tickets {
            ref search,
            ref quick,
            ref sort,
            all,
        } => {
            require_token(&cli)?;
            let filter = TicketFilter::from_params(
                search.as_deref(),
                quick.as_deref(),
                sort.as_deref(),
            );
            let loader = page_through(all, |offset| {
                client.list_tickets(offset, PAGE_SIZE, &filter)
            })
            .await?;
            if cli.json {
                print_json(&loader.items())?;
            } else {
                render::tickets(loader.items(), loader.total());
            }
        }

        Commands::Companies {
            ref search,
            ref sort,
            all,
        } => {
            require_token(&cli)?;
            let loader = page_through(all, |offset| {
                client.list_companies(offset, PAGE_SIZE, search.as_deref(), sort.as_deref())
            })
            .await?;
            if cli.json {
                print_json(&loader.items())?;
            } else {
                render::companies(loader.items(), loader.total());
            }
        }

        Commands::Campaigns {
            ref search,
            ref sort,
            all,
        } => {
            require_token(&cli)?;
            let loader = page_through(all, |offset| {
                client.list_campaigns(offset, PAGE_SIZE, search.as_deref(), sort.as_deref())
            })
            .await?;
            if cli.json {
                print_json(&loader.items())?;
            } else {
                render::campaigns(loader.items(), loader.total());
            }
        }

        Commands::Dashboard {
            ref period,
            ref start_date,
            ref end_date,
            include_old,
        } => {
            require_token(&cli)?;
            let view = client
                .dashboard(
                    period.as_deref(),
                    start_date.as_deref(),
                    end_date.as_deref(),
                    include_old,
                )
                .await
                .map_err(present)?;
            if cli.json {
                print_json(&view)?;
            } else {
                render::dashboard(&view);
            }
        }

        Commands::Status => {
            let health = client.health().await.map_err(present)?;
            if cli.json {
                print_json(&health)?;
            } else {
                render::health(&health);
            }
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Cli::command(), "deskctl", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Page through a list endpoint: one page, or all of them with `--all`.
/// Already-loaded rows survive a mid-run failure; the error is
/// reported alongside whatever accumulated.
async fn page_through<T, F, Fut>(all: bool, mut fetch: F) -> Result<Loader<T>>
where
    T: Keyed,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Page<T>, FetchError>>,
{
    let mut loader = Loader::new();

    loop {
        loader
            .load_more(&mut fetch)
            .await
            .map_err(|e| anyhow!("{e}"))?;

        if let Phase::Error(message) = loader.phase() {
            if loader.items().is_empty() {
                bail!("Fetch failed: {message}");
            }
            eprintln!(
                "warning: fetch failed after {} rows: {message}",
                loader.items().len()
            );
            break;
        }

        if !all || !loader.has_more() {
            break;
        }
    }

    Ok(loader)
}

fn require_token(cli: &Cli) -> Result<()> {
    if resolve_token(cli).is_none() {
        bail!(
            "No API token configured.\n\
             Pass --token or set $DESK_TOKEN to a token from the daemon's config."
        );
    }
    Ok(())
}

fn present(e: FetchError) -> anyhow::Error {
    anyhow!("{e}")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
