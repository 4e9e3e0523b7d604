//! # FX Hex
//!
//! Application service layer and HTTP adapter for the currency converter.
//!
//! ## Architecture
//!
//! - `cache` - In-memory pair/inverse rate cache
//! - `converter` - Application service (cache, optional store, fetcher)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The converter is generic over `F: RateFetcher`, so the remote chart
//! fetcher, the static table or a test double can be injected.

pub mod cache;
pub mod converter;
pub mod inbound;
pub mod openapi;


pub use cache::RateCache;
pub use converter::Converter;
pub use openapi::ApiDoc;
