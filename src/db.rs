use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard};

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_accounts.sql", include_str!("migrations/001_accounts.sql")),
    ("002_journal.sql", include_str!("migrations/002_journal.sql")),
    ("003_bible.sql", include_str!("migrations/003_bible.sql")),
    ("004_topics.sql", include_str!("migrations/004_topics.sql")),
    ("005_seed_bible.sql", include_str!("migrations/005_seed_bible.sql")),
];

const BUSY_TIMEOUT_MS: u64 = 5000;

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    tx_lock: Mutex<()>,
}

/// A write transaction on its own connection, so statements issued on the
/// shared connection meanwhile are never folded into it.
pub struct Transaction<'a> {
    conn: Connection,
    _guard: MutexGuard<'a, ()>,
}

impl Transaction<'_> {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Commits on `Ok`, rolls back on `Err`, and hands the result back.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Opens a dedicated connection and starts a write transaction on it.
    /// Transactions run one at a time.
    pub async fn begin(&self) -> Result<Transaction<'_>> {
        let guard = self.tx_lock.lock().await;
        let conn = Self::connect(&self.db).await?;
        conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(Transaction { conn, _guard: guard })
    }

    async fn connect(db: &LibsqlDatabase) -> Result<Connection> {
        let conn = db.connect()?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        // Returns the new value as a row, so it cannot go through `execute`;
        // the row must be stepped for the pragma to apply.
        let mut rows = conn
            .query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"), ())
            .await?;
        rows.next().await?;
        Ok(conn)
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in the config, relative to `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        Self::open(&path).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        tracing::info!(path = ?path, "[db] opening local database");
        let db = Builder::new_local(path).build().await?;

        let conn = Self::connect(&db).await?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            tx_lock: Mutex::new(()),
        })
    }
}
