//! Rate fetcher port.
//!
//! Implementations can be HTTP clients, static tables, test doubles, etc.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::CurrencyPair;
use crate::error::FetchError;

/// Port trait for current-rate sources.
///
/// Fetching is read-only and idempotent, so callers may retry freely.
#[async_trait::async_trait]
pub trait RateFetcher: Send + Sync + 'static {
    /// Returns how many units of `pair.to` one unit of `pair.from` buys.
    ///
    /// The raw upstream value is returned unvalidated; callers decide
    /// whether it is a usable rate. Implementations must return
    /// `FetchError::Cancelled` promptly once `cancel` fires.
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError>;
}

#[async_trait::async_trait]
impl<T: RateFetcher + ?Sized> RateFetcher for Box<T> {
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        (**self).fetch_rate(cancel, pair).await
    }
}

#[async_trait::async_trait]
impl<T: RateFetcher + ?Sized> RateFetcher for Arc<T> {
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        (**self).fetch_rate(cancel, pair).await
    }
}
