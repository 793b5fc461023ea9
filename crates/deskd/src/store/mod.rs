//! SQLite storage for the desk daemon.
//!
//! Single connection behind an async mutex; every query hops through
//! `spawn_blocking`. WAL mode keeps readers from blocking the webhook
//! writer. The store surfaces failures as typed `DeskError::Backend`
//! values — callers decide whether to retry, degrade, or propagate.

mod campaigns;
mod companies;
mod contacts;
mod tickets;

use anyhow::{Context, Result};
use desk_common::DeskError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Handle to the desk database.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        info!("Opening desk database at {}", path.display());

        let path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path).context("Failed to open SQLite database")?;

            // WAL so list reads don't block webhook writes
            conn.pragma_update(None, "journal_mode", "WAL")
                .context("Failed to enable WAL mode")?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .context("Failed to set synchronous mode")?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .context("Failed to enable foreign keys")?;

            Ok(conn)
        })
        .await??;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory database for tests and fixtures.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        self.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS tickets (
                    id TEXT PRIMARY KEY,
                    key TEXT NOT NULL UNIQUE,
                    subject TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    status TEXT NOT NULL,
                    company_id TEXT,
                    assignee TEXT,
                    time_spent_minutes INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    resolved_at TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets(created_at);
                CREATE INDEX IF NOT EXISTS idx_tickets_resolved ON tickets(resolved_at);
                CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);

                CREATE TABLE IF NOT EXISTS companies (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    domain TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);

                CREATE TABLE IF NOT EXISTS contacts (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    company_id TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS campaigns (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    starts_at TEXT NOT NULL,
                    ends_at TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_campaigns_starts ON campaigns(starts_at);",
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
        .context("Failed to initialize schema")
    }

    /// Run a closure against the connection on the blocking pool.
    pub(crate) async fn call<T, F>(&self, f: F) -> std::result::Result<T, DeskError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> std::result::Result<T, DeskError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| DeskError::Backend(format!("storage task panicked: {e}")))?
    }
}

/// Map a rusqlite failure into the permanent-backend bucket.
pub(crate) fn backend(e: rusqlite::Error) -> DeskError {
    DeskError::Backend(e.to_string())
}
