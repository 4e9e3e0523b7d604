//! Persistent rate store port.
//!
//! An optional second-level cache that survives restarts. Its absence
//! or failure must never change conversion results.

use crate::domain::{CurrencyPair, Rate};
use crate::error::StoreError;

#[async_trait::async_trait]
pub trait RateStore: Send + Sync + 'static {
    /// Returns the stored rate for `pair` if present and not expired.
    async fn get(&self, pair: &CurrencyPair) -> Result<Option<Rate>, StoreError>;

    /// Stores `rate` for `pair` and its reciprocal for the reversed pair.
    ///
    /// Both rows MUST be written atomically.
    async fn put(&self, pair: &CurrencyPair, rate: Rate) -> Result<(), StoreError>;
}
