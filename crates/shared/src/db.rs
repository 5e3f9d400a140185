//! Database operations for SQLite.
//!
//! Connections are opened per operation and closed when the operation
//! finishes, so no handle outlives a single logical unit of work.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to an SQLite database file
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create a database at the given path
    ///
    /// The file is switched to write-ahead logging once, up front. The mode is
    /// persistent, so later connections inherit it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let is_new = !path.exists();
        debug!(path = %path.display(), is_new, "Opening database");

        let db = Self { path };
        let conn = db.connect()?;
        let mode: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .context("Failed to enable WAL journal mode")?;

        if is_new {
            info!(path = %db.path.display(), journal_mode = %mode, "Created new database");
        }

        Ok(db)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("Failed to open database at {}", self.path.display()))
    }

    /// Run `f` inside a transaction on a fresh connection
    ///
    /// The transaction commits when `f` succeeds and rolls back otherwise.
    /// The connection is closed before this returns in both cases.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        let value = f(&*tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    /// Execute a batch of statements (schema creation and the like)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(sql).context("Failed to execute batch")?;
            Ok(())
        })
    }
}
