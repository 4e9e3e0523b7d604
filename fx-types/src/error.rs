//! Error types for the currency converter.

use crate::domain::CurrencyPair;

/// Domain-level errors (invariant violations on input values).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Currency code cannot be empty")]
    EmptyCurrencyCode,

    #[error("Invalid rate {0}: must be positive and finite")]
    InvalidRate(f64),
}

/// Failures while retrieving a rate from an upstream source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited by upstream")]
    RateLimited,

    #[error("Upstream rejected request with status {status}")]
    UpstreamRejected { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Upstream returned no result entries")]
    EmptyResult,

    #[error("Upstream returned unusable price {0}")]
    UnusablePrice(f64),

    #[error("No rate available for {0}")]
    Unsupported(CurrencyPair),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Both endpoints failed for {pair}: {last}")]
    Exhausted {
        pair: CurrencyPair,
        last: Box<FetchError>,
    },

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the same endpoint may be tried again after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::RateLimited)
    }
}

/// Persistent rate store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt stored rate for {pair}: {value}")]
    Corrupt { pair: String, value: f64 },
}

/// Errors surfaced by `Converter::convert`.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid quantity {0}: must be finite")]
    InvalidQuantity(f64),

    #[error("Quantity {quantity} at rate {rate} overflows the result")]
    AmountOverflow { quantity: f64, rate: f64 },

    #[error("fetch rate: {0}")]
    Fetch(FetchError),

    #[error("invalid rate {rate:.6} for {pair}")]
    InvalidRate { pair: CurrencyPair, rate: f64 },

    #[error("Conversion cancelled")]
    Cancelled,
}

impl From<FetchError> for ConvertError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => ConvertError::Cancelled,
            other => ConvertError::Fetch(other),
        }
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Domain(e) => AppError::BadRequest(e.to_string()),
            e @ (ConvertError::InvalidQuantity(_) | ConvertError::AmountOverflow { .. }) => {
                AppError::BadRequest(e.to_string())
            }
            e @ ConvertError::Cancelled => AppError::Timeout(e.to_string()),
            e @ (ConvertError::Fetch(_) | ConvertError::InvalidRate { .. }) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}
