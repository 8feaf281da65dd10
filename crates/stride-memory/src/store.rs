//! SQLite-backed durable store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use stride_core::config::MemoryConfig;
use stride_core::error::StrideError;

mod habits;
mod tasks;
mod users;

#[cfg(test)]
mod tests;

/// Durable storage for users, tasks, habits, and checkins.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the database, running migrations on first use.
    pub async fn new(config: &MemoryConfig) -> Result<Self, StrideError> {
        if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StrideError::Storage(format!("failed to create data dir: {e}"))
                })?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.db_path))
            .map_err(|e| StrideError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| StrideError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {}", config.db_path);

        Ok(Self { pool })
    }

    /// An in-memory store for tests.
    pub async fn in_memory() -> Result<Self, StrideError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StrideError::Storage(format!("invalid db path: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| StrideError::Storage(format!("failed to open in-memory db: {e}")))?;
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply unapplied migrations in order, tracked in `_migrations`.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), StrideError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| StrideError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        StrideError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| StrideError::Storage(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    StrideError::Storage(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

// Timestamps are stored as RFC 3339 text, dates as ISO `YYYY-MM-DD`.

pub(crate) fn encode_ts(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, StrideError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| StrideError::Storage(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<chrono::NaiveDate, StrideError> {
    raw.parse()
        .map_err(|e| StrideError::Storage(format!("bad date {raw:?}: {e}")))
}
