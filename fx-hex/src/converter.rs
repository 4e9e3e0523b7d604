//! Conversion Application Service
//!
//! Composes the rate cache, the optional persistent store and a fetcher.
//! Contains NO transport logic; adapters call [`Converter::convert`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use fx_types::{
    CancellationToken, Conversion, ConvertError, CurrencyPair, Rate, RateFetcher, RateStore,
};

use crate::cache::RateCache;

type Gates = DashMap<CurrencyPair, Arc<Mutex<()>>>;

/// Currency conversion service.
///
/// Generic over `F: RateFetcher`; the fetcher is injected at construction.
/// Each instance owns its own cache, so independent converters never share
/// rates.
pub struct Converter<F: RateFetcher> {
    fetcher: F,
    cache: RateCache,
    store: Option<Arc<dyn RateStore>>,
    /// One gate per pair currently being loaded.
    in_flight: Gates,
}

impl<F: RateFetcher> Converter<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: RateCache::new(),
            store: None,
            in_flight: DashMap::new(),
        }
    }

    /// Adds a persistent second-level store, consulted before the fetcher.
    pub fn with_store(mut self, store: Arc<dyn RateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Converts `quantity` units of `from` into `to`.
    ///
    /// Codes are trimmed and upper-cased. The call is bounded by `cancel`:
    /// once it fires, `ConvertError::Cancelled` is returned without waiting
    /// for an outstanding fetch.
    #[instrument(skip(self, cancel))]
    pub async fn convert(
        &self,
        cancel: &CancellationToken,
        from: &str,
        to: &str,
        quantity: f64,
    ) -> Result<Conversion, ConvertError> {
        let pair = CurrencyPair::parse(from, to)?;
        if !quantity.is_finite() {
            return Err(ConvertError::InvalidQuantity(quantity));
        }

        let rate = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConvertError::Cancelled),
            rate = self.rate(cancel, &pair) => rate?,
        };

        // A finite quantity times a valid rate can still leave f64 range.
        if !rate.apply(quantity).is_finite() {
            return Err(ConvertError::AmountOverflow {
                quantity,
                rate: rate.value(),
            });
        }

        Ok(Conversion::new(pair, rate, quantity))
    }

    /// Returns the rate for `pair`, loading it on a cache miss.
    ///
    /// Concurrent misses for the same pair share a gate: the first caller
    /// loads, the rest wait and then read the cache.
    pub async fn rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<Rate, ConvertError> {
        if let Some(rate) = self.cache.get(pair) {
            debug!(%pair, rate = rate.value(), "Cache hit");
            return Ok(rate);
        }

        let gate = Gate::acquire(&self.in_flight, pair);
        let _held = gate.lock.lock().await;

        // Whoever held the gate before us may have filled the cache.
        if let Some(rate) = self.cache.get(pair) {
            debug!(%pair, "Loaded by a concurrent request");
            return Ok(rate);
        }

        self.load(cancel, pair).await
    }

    async fn load(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<Rate, ConvertError> {
        if let Some(rate) = self.stored(pair).await {
            self.cache.put(pair, rate);
            return Ok(rate);
        }

        debug!(%pair, "Cache miss, fetching");
        let raw = self.fetcher.fetch_rate(cancel, pair).await?;
        let rate = Rate::new(raw).map_err(|_| ConvertError::InvalidRate {
            pair: pair.clone(),
            rate: raw,
        })?;

        self.cache.put(pair, rate);
        if let Some(store) = &self.store {
            if let Err(e) = store.put(pair, rate).await {
                warn!(%pair, error = %e, "Failed to persist rate");
            }
        }

        Ok(rate)
    }

    /// Store lookup; failures count as a miss.
    async fn stored(&self, pair: &CurrencyPair) -> Option<Rate> {
        let store = self.store.as_ref()?;
        match store.get(pair).await {
            Ok(Some(rate)) => {
                debug!(%pair, rate = rate.value(), "Store hit");
                Some(rate)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%pair, error = %e, "Rate store lookup failed");
                None
            }
        }
    }

    /// Number of pairs with a load in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Shared handle on a pair's gate. Dropping the last handle removes the
/// gate from the map, including when the owning future is cancelled.
struct Gate<'a> {
    gates: &'a Gates,
    pair: &'a CurrencyPair,
    lock: Arc<Mutex<()>>,
}

impl<'a> Gate<'a> {
    fn acquire(gates: &'a Gates, pair: &'a CurrencyPair) -> Self {
        let lock = gates.entry(pair.clone()).or_default().clone();
        Self { gates, pair, lock }
    }
}

impl Drop for Gate<'_> {
    fn drop(&mut self) {
        // Two handles left: the map's and ours.
        self.gates.remove_if(self.pair, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}
