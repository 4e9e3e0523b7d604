//! Currency codes and ordered currency pairs.

use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A currency identifier such as `USD`.
///
/// Codes are trimmed and upper-cased on construction. They are not checked
/// against any registry: whatever the caller supplies is forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a normalised currency code.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DomainError::EmptyCurrencyCode);
        }
        Ok(Self(code.to_uppercase()))
    }

    /// Returns the normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An ordered `(from, to)` pair, used as the cache key.
///
/// `(A, B)` and `(B, A)` are distinct keys; their rates are reciprocals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }

    /// Normalises both codes and builds the pair.
    pub fn parse(from: &str, to: &str) -> Result<Self, DomainError> {
        Ok(Self::new(CurrencyCode::new(from)?, CurrencyCode::new(to)?))
    }

    /// Returns the reversed pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// Concatenated symbol, e.g. `USDEUR`, as used in upstream tickers.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_normalised() {
        let code = CurrencyCode::new("  usd ").unwrap();
        assert_eq!(code.as_str(), "USD");
    }

    #[test]
    fn test_empty_code_fails() {
        assert!(matches!(
            CurrencyCode::new("   "),
            Err(DomainError::EmptyCurrencyCode)
        ));
    }

    #[test]
    fn test_unknown_codes_are_accepted() {
        let code: CurrencyCode = "xyz1".parse().unwrap();
        assert_eq!(code.to_string(), "XYZ1");
    }

    #[test]
    fn test_pair_inverse_and_symbol() {
        let pair = CurrencyPair::parse("usd", "eur").unwrap();
        assert_eq!(pair.symbol(), "USDEUR");
        assert_eq!(pair.to_string(), "USD/EUR");
        assert_eq!(pair.inverse().symbol(), "EURUSD");
        assert_eq!(pair.inverse().inverse(), pair);
    }
}
