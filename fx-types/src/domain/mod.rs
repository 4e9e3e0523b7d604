//! Domain models for the currency converter.

pub mod conversion;
pub mod currency;
pub mod rate;

pub use conversion::Conversion;
pub use currency::{CurrencyCode, CurrencyPair};
pub use rate::Rate;
