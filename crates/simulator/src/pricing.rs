//! Gas estimation and displayed price quotes

use config::SimulationConfig;
use rand::Rng;
use types::{CryptoCurrency, CurrencyTable, SimulationError};

/// Maximum relative drift of a quoted price when volatility is enabled
pub const VOLATILITY_BAND: f64 = 0.02;

/// Static gas lookup scaled by the configured multiplier
pub struct GasEstimator;

impl GasEstimator {
    /// `gas_price(symbol) × multiplier`, unrounded
    pub fn estimate(symbol: &str, multiplier: f64) -> Result<f64, SimulationError> {
        let currency = CurrencyTable::get(symbol).ok_or_else(|| {
            SimulationError::UnsupportedCurrency {
                symbol: symbol.to_string(),
            }
        })?;
        Ok(Self::estimate_for(currency, multiplier))
    }

    pub fn estimate_for(currency: &CryptoCurrency, multiplier: f64) -> f64 {
        currency.gas_price * multiplier
    }
}

/// USD price shown to the user. With volatility on the table price drifts
/// uniformly within ±[`VOLATILITY_BAND`]; conversions always use the table
/// price.
pub fn quote_price<R: Rng + ?Sized>(
    currency: &CryptoCurrency,
    config: &SimulationConfig,
    rng: &mut R,
) -> f64 {
    if !config.volatility_enabled {
        return currency.usd_price;
    }
    let drift = rng.gen_range(-VOLATILITY_BAND..=VOLATILITY_BAND);
    currency.usd_price * (1.0 + drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_estimate_is_exact_product() {
        for multiplier in [0.5, 1.0, 1.5, 2.3, 3.0] {
            for currency in CurrencyTable::all() {
                let gas = GasEstimator::estimate(&currency.symbol, multiplier).unwrap();
                assert_eq!(gas, currency.gas_price * multiplier);
            }
        }
        assert_eq!(GasEstimator::estimate("ETH", 1.5).unwrap(), 37.5);
    }

    #[test]
    fn test_estimate_rejects_unknown_symbols() {
        for symbol in ["DOGE", "eth", "", "USD"] {
            let err = GasEstimator::estimate(symbol, 1.0).unwrap_err();
            assert_eq!(
                err,
                SimulationError::UnsupportedCurrency {
                    symbol: symbol.to_string()
                }
            );
        }
    }

    #[test]
    fn test_quote_price_stays_in_band() {
        let eth = CurrencyTable::get("ETH").unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let config = SimulationConfig::default();

        for _ in 0..1000 {
            let price = quote_price(eth, &config, &mut rng);
            assert!(price >= 2400.0 * 0.98 && price <= 2400.0 * 1.02);
        }

        let calm = SimulationConfig {
            volatility_enabled: false,
            ..SimulationConfig::default()
        };
        assert_eq!(quote_price(eth, &calm, &mut rng), 2400.0);
    }
}
