//! Port traits (interfaces for adapters).
//!
//! The converter depends on these traits, not on concrete fetchers or stores.

mod fetcher;
mod store;

pub use fetcher::RateFetcher;
pub use store::RateStore;
