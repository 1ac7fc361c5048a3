//! Payment calculation engine

use config::SimulationConfig;
use simulator::{quote_price, ChainSimulator};
use types::{CryptoCurrency, CurrencyTable, PaymentQuote, SimulationError};

/// Converts USD amounts into crypto amounts at the static table price
#[derive(Debug, Clone, Default)]
pub struct PaymentCalculator;

impl PaymentCalculator {
    /// Create a new payment calculator
    pub fn new() -> Self {
        Self
    }

    /// `usd_amount / usd_price`
    pub fn crypto_amount(
        &self,
        usd_amount: f64,
        currency: &CryptoCurrency,
    ) -> Result<f64, SimulationError> {
        Self::validate_amount(usd_amount)?;
        Ok(usd_amount / currency.usd_price)
    }

    /// Quote with the gas fee estimated by `chain`
    pub async fn quote(
        &self,
        chain: &dyn ChainSimulator,
        usd_amount: f64,
        symbol: &str,
        config: &SimulationConfig,
    ) -> Result<PaymentQuote, SimulationError> {
        let currency = Self::currency(symbol)?;
        let crypto_amount = self.crypto_amount(usd_amount, currency)?;
        let gas_fee = chain.estimate_gas(symbol, crypto_amount, config).await?;
        Ok(PaymentQuote::new(usd_amount, symbol, crypto_amount, gas_fee))
    }

    /// Quote with an already known gas fee
    pub fn quote_with_gas(
        &self,
        usd_amount: f64,
        currency: &CryptoCurrency,
        gas_fee_usd: f64,
    ) -> Result<PaymentQuote, SimulationError> {
        let crypto_amount = self.crypto_amount(usd_amount, currency)?;
        Ok(PaymentQuote::new(
            usd_amount,
            &currency.symbol,
            crypto_amount,
            gas_fee_usd,
        ))
    }

    /// Price shown next to a quote; drifts when volatility is enabled
    pub fn display_price(&self, currency: &CryptoCurrency, config: &SimulationConfig) -> f64 {
        quote_price(currency, config, &mut rand::thread_rng())
    }

    pub fn currency(symbol: &str) -> Result<&'static CryptoCurrency, SimulationError> {
        CurrencyTable::get(symbol).ok_or_else(|| SimulationError::UnsupportedCurrency {
            symbol: symbol.to_string(),
        })
    }

    fn validate_amount(usd_amount: f64) -> Result<(), SimulationError> {
        if !usd_amount.is_finite() || usd_amount <= 0.0 {
            return Err(SimulationError::InvalidAmount(format!(
                "USD amount must be a positive number, got {}",
                usd_amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulator::MockChain;

    #[test]
    fn test_tuition_in_eth_is_exact() {
        let calculator = PaymentCalculator::new();
        let eth = CurrencyTable::get("ETH").unwrap();
        assert_eq!(calculator.crypto_amount(6000.0, eth).unwrap(), 2.5);

        let usdc = CurrencyTable::get("USDC").unwrap();
        assert_eq!(calculator.crypto_amount(7500.0, usdc).unwrap(), 7500.0);
    }

    #[test]
    fn test_invalid_amounts() {
        let calculator = PaymentCalculator::new();
        let eth = CurrencyTable::get("ETH").unwrap();
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                calculator.crypto_amount(amount, eth),
                Err(SimulationError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_quote_includes_gas() {
        let calculator = PaymentCalculator::new();
        let chain = MockChain::instant();
        let config = SimulationConfig {
            gas_multiplier: 1.5,
            ..SimulationConfig::default()
        };

        let quote = calculator.quote(&chain, 6000.0, "ETH", &config).await.unwrap();
        assert_eq!(quote.crypto_amount, 2.5);
        assert_eq!(quote.gas_fee_usd, 37.5);
        assert_eq!(quote.total_usd, 6037.5);
        assert_eq!(quote.currency, "ETH");

        assert!(matches!(
            calculator.quote(&chain, 6000.0, "DOGE", &config).await,
            Err(SimulationError::UnsupportedCurrency { .. })
        ));
    }

    #[test]
    fn test_quote_for_every_currency() {
        let calculator = PaymentCalculator::new();
        let chain = MockChain::instant();
        let config = SimulationConfig::default();

        for currency in CurrencyTable::all() {
            let quote = tokio_test::assert_ok!(tokio_test::block_on(calculator.quote(
                &chain,
                1000.0,
                &currency.symbol,
                &config
            )));
            assert_eq!(quote.gas_fee_usd, currency.gas_price);
            assert_eq!(quote.crypto_amount, 1000.0 / currency.usd_price);
        }
    }

    #[test]
    fn test_display_price_without_volatility() {
        let config = SimulationConfig {
            volatility_enabled: false,
            ..SimulationConfig::default()
        };
        let btc = CurrencyTable::get("BTC").unwrap();
        assert_eq!(PaymentCalculator::new().display_price(btc, &config), 43000.0);
    }
}
