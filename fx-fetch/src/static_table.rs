//! Fixed rate table for offline conversions and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use fx_types::{CancellationToken, CurrencyCode, CurrencyPair, DomainError, FetchError, RateFetcher};

/// Answers from a table of "USD per unit" values.
///
/// The rate for `(A, B)` is `usd(A) / usd(B)`, so every pair of listed
/// currencies is covered without storing the cross rates.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    usd_per_unit: HashMap<CurrencyCode, f64>,
}

impl StaticFetcher {
    /// Builds a table from `(code, USD per unit)` entries.
    pub fn from_usd_rates<'a>(
        rates: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self, DomainError> {
        let usd_per_unit = rates
            .into_iter()
            .map(|(code, usd)| Ok((CurrencyCode::new(code)?, usd)))
            .collect::<Result<_, DomainError>>()?;
        Ok(Self { usd_per_unit })
    }

    /// Codes present in the table, in no particular order.
    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.usd_per_unit.keys()
    }
}

impl Default for StaticFetcher {
    fn default() -> Self {
        let usd_per_unit = [
            ("USD", 1.0),
            ("EUR", 1.087),
            ("GBP", 1.266),
            ("INR", 0.01203),
        ]
        .into_iter()
        .filter_map(|(code, usd)| Some((CurrencyCode::new(code).ok()?, usd)))
        .collect();
        Self { usd_per_unit }
    }
}

#[async_trait]
impl RateFetcher for StaticFetcher {
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let unsupported = || FetchError::Unsupported(pair.clone());
        let from = self.usd_per_unit.get(&pair.from).ok_or_else(unsupported)?;
        let to = self.usd_per_unit.get(&pair.to).ok_or_else(unsupported)?;
        Ok(from / to)
    }
}
