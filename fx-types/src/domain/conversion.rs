//! Result of converting a quantity across a currency pair.

use std::fmt;

use super::{CurrencyPair, Rate};

/// A completed conversion. Derived on every call, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub pair: CurrencyPair,
    pub rate: Rate,
    pub inverse_rate: Rate,
    pub quantity: f64,
    pub amount: f64,
}

impl Conversion {
    pub fn new(pair: CurrencyPair, rate: Rate, quantity: f64) -> Self {
        Self {
            pair,
            rate,
            inverse_rate: rate.inverse(),
            quantity,
            amount: rate.apply(quantity),
        }
    }
}

/// Plain-text rendering shared by the CLI and the `?format=text` endpoint.
impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (from, to) = (&self.pair.from, &self.pair.to);
        writeln!(f, "Amount: {} {}", self.quantity, from)?;
        writeln!(f)?;
        writeln!(f, "1 {} = {:.4} {}", from, self.rate.value(), to)?;
        writeln!(f, "1 {} = {:.4} {}", to, self.inverse_rate.value(), from)?;
        writeln!(f)?;
        writeln!(f, "Result: {:.2} {}", self.amount, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_eur() -> CurrencyPair {
        CurrencyPair::parse("USD", "EUR").unwrap()
    }

    #[test]
    fn test_conversion_arithmetic() {
        let conversion = Conversion::new(usd_eur(), Rate::new(1.2).unwrap(), 5.0);
        assert_eq!(conversion.amount, 6.0);
        assert_eq!(conversion.inverse_rate.value(), 1.0 / 1.2);
    }

    #[test]
    fn test_text_rendering() {
        let conversion = Conversion::new(usd_eur(), Rate::new(1.2).unwrap(), 5.0);
        let text = conversion.to_string();
        assert_eq!(
            text,
            "Amount: 5 USD\n\n1 USD = 1.2000 EUR\n1 EUR = 0.8333 USD\n\nResult: 6.00 EUR\n"
        );
    }
}
