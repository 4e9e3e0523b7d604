//! In-memory rate cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use fx_types::{CurrencyPair, Rate};

/// Maps ordered currency pairs to rates.
///
/// A rate and its reciprocal are always written under the same lock, so a
/// reader can never observe `(A, B)` without `(B, A)`. Entries live as long
/// as the cache itself.
#[derive(Debug, Default)]
pub struct RateCache {
    rates: Mutex<HashMap<CurrencyPair, Rate>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `pair`. No side effects.
    pub fn get(&self, pair: &CurrencyPair) -> Option<Rate> {
        self.lock().get(pair).copied()
    }

    /// Stores `rate` for `pair` and its inverse for the reversed pair.
    pub fn put(&self, pair: &CurrencyPair, rate: Rate) {
        let mut rates = self.lock();
        rates.insert(pair.clone(), rate);
        rates.insert(pair.inverse(), rate.inverse());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written pair
    // behind (both inserts are infallible), so the data is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<CurrencyPair, Rate>> {
        self.rates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
