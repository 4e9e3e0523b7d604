//! SQLite rate store adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use fx_types::{CurrencyPair, Rate, RateStore, StoreError};

/// How long a stored rate stays usable unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

const SCHEMA: &str = include_str!("../migrations/0001_create_rates.sql");

#[derive(FromRow)]
struct DbRate {
    rate: f64,
}

/// SQLite-backed [`RateStore`] with a per-row expiry.
pub struct SqliteRateStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteRateStore {
    /// Connects and creates the schema if missing.
    pub async fn new(database_url: &str, ttl: Duration) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database gets its own empty
        // database, so the pool must hold exactly one and never recycle it.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = Self::with_pool(pool, ttl);
        store.create_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool. Call [`create_schema`](Self::create_schema)
    /// before use.
    pub fn with_pool(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(())
    }

    /// Deletes expired rows and returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM rates WHERE expires_at <= ?"#)
            .bind(now())
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(result.rows_affected())
    }

    fn expires_at(&self, stored_at: i64) -> i64 {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        stored_at.saturating_add(ttl)
    }
}

#[async_trait]
impl RateStore for SqliteRateStore {
    async fn get(&self, pair: &CurrencyPair) -> Result<Option<Rate>, StoreError> {
        let key = pair.to_string();
        let row: Option<DbRate> =
            sqlx::query_as(r#"SELECT rate FROM rates WHERE pair = ? AND expires_at > ?"#)
                .bind(&key)
                .bind(now())
                .fetch_optional(&self.pool)
                .await
                .map_err(database)?;

        row.map(|row| {
            Rate::new(row.rate).map_err(|_| StoreError::Corrupt {
                pair: key.clone(),
                value: row.rate,
            })
        })
        .transpose()
    }

    async fn put(&self, pair: &CurrencyPair, rate: Rate) -> Result<(), StoreError> {
        let stored_at = now();
        let expires_at = self.expires_at(stored_at);

        let mut db_tx = self.pool.begin().await.map_err(database)?;

        for (key, value) in [
            (pair.to_string(), rate),
            (pair.inverse().to_string(), rate.inverse()),
        ] {
            sqlx::query(
                r#"INSERT INTO rates (pair, rate, stored_at, expires_at) VALUES (?, ?, ?, ?)
                   ON CONFLICT(pair) DO UPDATE SET
                       rate = excluded.rate,
                       stored_at = excluded.stored_at,
                       expires_at = excluded.expires_at"#,
            )
            .bind(&key)
            .bind(value.value())
            .bind(stored_at)
            .bind(expires_at)
            .execute(&mut *db_tx)
            .await
            .map_err(database)?;
        }

        db_tx.commit().await.map_err(database)?;
        Ok(())
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn database(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}
