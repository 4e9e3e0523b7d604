//! Validated exchange rate.

use std::fmt;

use crate::error::DomainError;

/// Multiplicative factor converting one unit of `from` into `to`.
///
/// Always positive and finite, and so is its reciprocal. A zero or negative
/// value can never be represented, so it can never reach the cache or the
/// conversion arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    /// Validates a raw value.
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && value > 0.0 && value.recip().is_finite() {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidRate(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Rate for the reversed pair.
    pub fn inverse(&self) -> Rate {
        Rate(1.0 / self.0)
    }

    /// Converts a quantity of the source currency.
    pub fn apply(&self, quantity: f64) -> f64 {
        self.0 * quantity
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
