//! # FX Types
//!
//! Domain types and port traits for the currency converter.
//! This crate has no IO dependencies - only data structures,
//! invariants, and trait definitions.
//!
//! ## Architecture
//!
//! This crate is the **innermost core** of the hexagonal architecture:
//! - `domain/` - Currency codes, pairs, rates and conversions
//! - `ports/` - Traits that fetchers and persistent stores implement
//! - `dto/` - Request/response bodies for the HTTP boundary
//! - `error/` - Domain, fetch, store and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{Conversion, CurrencyCode, CurrencyPair, Rate};
pub use dto::*;
pub use error::{AppError, ConvertError, DomainError, FetchError, StoreError};
pub use ports::{RateFetcher, RateStore};

/// Cancellation handle threaded through every suspending operation.
pub use tokio_util::sync::CancellationToken;
