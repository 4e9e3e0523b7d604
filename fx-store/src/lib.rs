//! # FX Store
//!
//! Persistent second-level cache for exchange rates.
//! Implements the `RateStore` port over SQLite so fetched rates survive
//! restarts until their time-to-live runs out.

pub mod sqlite;


pub use sqlite::{DEFAULT_TTL, SqliteRateStore};

/// Connect to `database_url`, create the schema and drop expired rows.
///
/// # Examples
///
/// ```ignore
/// let store = build_store("sqlite://data/rates.db?mode=rwc", DEFAULT_TTL).await?;
/// ```
pub async fn build_store(
    database_url: &str,
    ttl: std::time::Duration,
) -> anyhow::Result<SqliteRateStore> {
    let store = SqliteRateStore::new(database_url, ttl).await?;
    let purged = store.purge_expired().await?;
    tracing::info!(purged, ttl_secs = store.ttl().as_secs(), "Rate store ready");
    Ok(store)
}
