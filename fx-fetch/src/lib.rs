//! # FX Fetch
//!
//! `RateFetcher` implementations:
//! - [`ChartFetcher`] queries a chart-style market-data API across a primary
//!   and a secondary endpoint, retrying rate-limit and transport failures
//!   with exponential backoff.
//! - [`StaticFetcher`] answers from a fixed table of rates against USD, for
//!   offline use and tests.
//!
//! # Example
//! ```
//! use fx_fetch::StaticFetcher;
//! use fx_types::{CancellationToken, CurrencyPair, RateFetcher};
//!
//! # tokio_test_block_on(async {
//! let fetcher = StaticFetcher::default();
//! let pair = CurrencyPair::parse("usd", "usd").unwrap();
//! let rate = fetcher.fetch_rate(&CancellationToken::new(), &pair).await.unwrap();
//! assert_eq!(rate, 1.0);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod backoff;
mod chart;
mod static_table;

pub use backoff::Backoff;
pub use chart::{ChartFetcher, ChartFetcherConfig, DEFAULT_PRIMARY_URL, DEFAULT_SECONDARY_URL};
pub use reqwest::Url;
pub use static_table::StaticFetcher;
