//! Mock chain implementation

use crate::failure::FailureInjector;
use crate::hash::generate_tx_hash;
use crate::pricing::GasEstimator;
use crate::ticker::TickerOutcome;
use crate::traits::{BlockReceipt, ChainSimulator, TRANSFER_GAS_USED};
use async_trait::async_trait;
use chrono::Utc;
use config::{LatencyConfig, SimulationConfig};
use rand::Rng;
use std::ops::Range;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use types::{CryptoCurrency, SimulationError};

const BLOCK_RANGE: Range<u64> = 18_000_000..19_000_000;

/// In-process chain with artificial latency and injected failures
#[derive(Debug, Clone)]
pub struct MockChain {
    name: String,
    latency: LatencyConfig,
}

impl MockChain {
    pub fn new(latency: LatencyConfig) -> Self {
        Self {
            name: "mock-chain".to_string(),
            latency,
        }
    }

    /// No artificial delays
    pub fn instant() -> Self {
        Self::new(LatencyConfig::instant())
    }

    pub fn latency(&self) -> &LatencyConfig {
        &self.latency
    }

    /// Count confirmations for `tx_hash` at the configured speed, reporting
    /// each to `on_progress`, and return the receipt once the threshold is
    /// reached. Returns `Ok(None)` when `cancel` fires first.
    pub async fn simulate_confirmation_progress<F>(
        &self,
        tx_hash: &str,
        currency: &CryptoCurrency,
        required: u32,
        config: &SimulationConfig,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Option<BlockReceipt>
    where
        F: FnMut(u32) + Send,
    {
        let ticker = self.confirmation_ticker(config, required);
        match ticker.run(cancel, on_progress).await {
            TickerOutcome::Completed { confirmations } => {
                Some(self.block_receipt(tx_hash, currency, confirmations))
            }
            TickerOutcome::Cancelled { confirmations } => {
                tracing::info!(tx_hash, confirmations, "Confirmation stopped before threshold");
                None
            }
        }
    }

    async fn delay(ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(LatencyConfig::default())
    }
}

#[async_trait]
impl ChainSimulator for MockChain {
    async fn estimate_gas(
        &self,
        symbol: &str,
        amount: f64,
        config: &SimulationConfig,
    ) -> Result<f64, SimulationError> {
        Self::delay(self.latency.gas_estimate_ms).await;
        let gas = GasEstimator::estimate(symbol, config.gas_multiplier)?;
        tracing::debug!(symbol, amount, gas, "Estimated gas");
        Ok(gas)
    }

    async fn initiate_payment(
        &self,
        amount: f64,
        currency: &CryptoCurrency,
        recipient: &str,
        config: &SimulationConfig,
    ) -> Result<String, SimulationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SimulationError::InvalidAmount(format!(
                "{} {} is not a payable amount",
                amount, currency.symbol
            )));
        }

        Self::delay(self.latency.initiate_payment_ms).await;

        let outcome = {
            let mut rng = rand::thread_rng();
            FailureInjector::new(config.failure_rate)
                .check(&mut rng)
                .map(|_| generate_tx_hash(&mut rng))
        };

        match &outcome {
            Ok(tx_hash) => tracing::info!(
                tx_hash = %tx_hash,
                amount,
                currency = %currency.symbol,
                recipient,
                "Payment submitted"
            ),
            Err(e) => tracing::warn!(
                amount,
                currency = %currency.symbol,
                failure_rate = config.failure_rate,
                error = %e,
                "Payment rejected by simulated network"
            ),
        }

        outcome
    }

    async fn confirm_transaction(
        &self,
        tx_hash: &str,
        currency: &CryptoCurrency,
        required: u32,
        config: &SimulationConfig,
    ) -> Result<BlockReceipt, SimulationError> {
        let cancel = CancellationToken::new();
        self.simulate_confirmation_progress(tx_hash, currency, required, config, &cancel, |_| {})
            .await
            .ok_or_else(|| SimulationError::TickerAborted(tx_hash.to_string()))
    }

    fn block_receipt(
        &self,
        tx_hash: &str,
        currency: &CryptoCurrency,
        confirmations: u32,
    ) -> BlockReceipt {
        let block_number = rand::thread_rng().gen_range(BLOCK_RANGE);
        BlockReceipt {
            tx_hash: tx_hash.to_string(),
            block_number,
            gas_used: TRANSFER_GAS_USED,
            gas_price: currency.gas_price,
            confirmations,
            confirmed_at: Utc::now(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ConfirmationSpeed;
    use tokio::time::Instant;
    use types::CurrencyTable;

    fn eth() -> &'static CryptoCurrency {
        CurrencyTable::get("ETH").unwrap()
    }

    fn config(failure_rate: f64) -> SimulationConfig {
        SimulationConfig {
            failure_rate,
            ..SimulationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let chain = MockChain::instant();
        let cfg = SimulationConfig {
            gas_multiplier: 2.0,
            ..SimulationConfig::default()
        };

        assert_eq!(chain.estimate_gas("ETH", 1.0, &cfg).await.unwrap(), 50.0);
        assert_eq!(chain.estimate_gas("USDC", 1.0, &cfg).await.unwrap(), 30.0);
        assert!(matches!(
            chain.estimate_gas("DOGE", 1.0, &cfg).await,
            Err(SimulationError::UnsupportedCurrency { .. })
        ));
    }

    #[tokio::test]
    async fn test_certain_failure_never_yields_hash() {
        let chain = MockChain::instant();
        for _ in 0..200 {
            let err = tokio_test::assert_err!(
                chain.initiate_payment(1.0, eth(), "0xabc", &config(1.0)).await
            );
            assert_eq!(err, SimulationError::TransactionFailed);
        }
    }

    #[tokio::test]
    async fn test_zero_failure_always_yields_hash() {
        let chain = MockChain::instant();
        for _ in 0..200 {
            let hash = chain
                .initiate_payment(1.0, eth(), "0xabc", &config(0.0))
                .await
                .unwrap();
            assert!(types::utils::is_valid_tx_hash(&hash));
        }
    }

    #[tokio::test]
    async fn test_failure_ratio_over_many_payments() {
        let chain = MockChain::instant();
        let cfg = config(0.3);
        let mut failures = 0;
        for _ in 0..10_000 {
            if chain.initiate_payment(1.0, eth(), "0xabc", &cfg).await.is_err() {
                failures += 1;
            }
        }
        let ratio = failures as f64 / 10_000.0;
        assert!((ratio - 0.3).abs() < 0.03, "ratio {}", ratio);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let chain = MockChain::instant();
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                chain.initiate_payment(amount, eth(), "0xabc", &config(0.0)).await,
                Err(SimulationError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initiate_payment_waits_configured_latency() {
        let chain = MockChain::default();
        let start = Instant::now();
        let _ = chain.initiate_payment(1.0, eth(), "0xabc", &config(0.0)).await;
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_transaction_receipt() {
        let chain = MockChain::instant();
        let cfg = SimulationConfig {
            confirmation_speed: ConfirmationSpeed::Fast,
            ..SimulationConfig::default()
        };

        let start = Instant::now();
        let receipt = chain
            .confirm_transaction("0xfeed", eth(), 6, &cfg)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(1990));
        assert_eq!(receipt.tx_hash, "0xfeed");
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.confirmations, 6);
        assert!(BLOCK_RANGE.contains(&receipt.block_number));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_can_be_cancelled() {
        let chain = MockChain::instant();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut seen = Vec::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1800)).await;
            trigger.cancel();
        });

        let receipt = chain
            .simulate_confirmation_progress(
                "0xfeed",
                eth(),
                6,
                &config(0.0),
                &cancel,
                |n| seen.push(n),
            )
            .await;

        assert!(receipt.is_none());
        assert_eq!(seen, vec![1, 2]);
    }
}
