//! Static currency reference data

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A supported cryptocurrency with its mock market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CryptoCurrency {
    /// Ticker symbol, e.g. `ETH`
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Display glyph
    pub icon: String,
    /// Price of one unit in USD
    pub usd_price: f64,
    /// Base gas fee in USD
    pub gas_price: f64,
    /// Typical confirmation time in minutes
    pub confirmation_time: u32,
}

static SUPPORTED_CURRENCIES: LazyLock<Vec<CryptoCurrency>> = LazyLock::new(|| {
    vec![
        CryptoCurrency::new("USDC", "USD Coin", "🔵", 1.00, 15.0, 2),
        CryptoCurrency::new("ETH", "Ethereum", "⟐", 2400.0, 25.0, 5),
        CryptoCurrency::new("BTC", "Bitcoin", "₿", 43000.0, 50.0, 15),
    ]
});

/// Lookup over the static currency list
pub struct CurrencyTable;

impl CurrencyTable {
    /// All supported currencies in display order
    pub fn all() -> &'static [CryptoCurrency] {
        &SUPPORTED_CURRENCIES
    }

    /// Find a currency by symbol (case-sensitive, as stored)
    pub fn get(symbol: &str) -> Option<&'static CryptoCurrency> {
        SUPPORTED_CURRENCIES.iter().find(|c| c.symbol == symbol)
    }

    /// Whether the symbol is in the table
    pub fn is_supported(symbol: &str) -> bool {
        Self::get(symbol).is_some()
    }

    /// Supported symbols
    pub fn symbols() -> Vec<&'static str> {
        SUPPORTED_CURRENCIES.iter().map(|c| c.symbol.as_str()).collect()
    }
}

impl CryptoCurrency {
    fn new(
        symbol: &str,
        name: &str,
        icon: &str,
        usd_price: f64,
        gas_price: f64,
        confirmation_time: u32,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            usd_price,
            gas_price,
            confirmation_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_contents() {
        assert_eq!(CurrencyTable::symbols(), vec!["USDC", "ETH", "BTC"]);

        let eth = CurrencyTable::get("ETH").unwrap();
        assert_eq!(eth.usd_price, 2400.0);
        assert_eq!(eth.gas_price, 25.0);
        assert_eq!(eth.confirmation_time, 5);
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(CurrencyTable::get("DOGE").is_none());
        assert!(CurrencyTable::get("eth").is_none());
        assert!(!CurrencyTable::is_supported(""));
    }
}
