//! CLI - command-line argument parsing.
//!
//! Defines the clap structure only; execution lives in `commands`.

use clap::{Parser, Subcommand};

/// Desk CLI
#[derive(Parser)]
#[command(name = "deskctl")]
#[command(about = "Desk - support ticket lists and reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Daemon base URL (overrides $DESK_SERVER and the default)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// API token (overrides $DESK_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List tickets
    Tickets {
        /// Free-text search over subject and key
        #[arg(long)]
        search: Option<String>,

        /// Quick filter: open, resolved, bugs, requests, assistances
        #[arg(long)]
        quick: Option<String>,

        /// Sort as "<column>:<direction>", e.g. created_at:desc
        #[arg(long)]
        sort: Option<String>,

        /// Page through everything instead of the first page
        #[arg(long)]
        all: bool,
    },

    /// List companies
    Companies {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// List campaigns
    Campaigns {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// Show dashboard statistics
    Dashboard {
        /// Reporting period: day, week, month, quarter, year
        #[arg(long)]
        period: Option<String>,

        /// ISO start date override (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// ISO end date override (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Count pre-window tickets into the backlog
        #[arg(long)]
        include_old: bool,
    },

    /// Show daemon health
    Status,

    /// Generate shell completions (hidden - for packaging)
    #[command(hide = true)]
    Completions {
        shell: clap_complete::Shell,
    },
}
