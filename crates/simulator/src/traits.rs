//! Chain simulator traits and interfaces

use crate::ticker::ConfirmationTicker;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config::SimulationConfig;
use serde::{Deserialize, Serialize};
use types::{CryptoCurrency, SimulationError};

/// Gas consumed by every simulated transfer
pub const TRANSFER_GAS_USED: u64 = 21_000;

/// Block data attached to a transaction once it is confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReceipt {
    /// Hash of the confirmed transaction
    pub tx_hash: String,
    /// Block the transaction landed in
    pub block_number: u64,
    /// Gas consumed
    pub gas_used: u64,
    /// Gas price of the currency at confirmation, in USD
    pub gas_price: f64,
    /// Confirmations observed
    pub confirmations: u32,
    /// When the receipt was produced
    pub confirmed_at: DateTime<Utc>,
}

/// Trait for mock chains the portal submits payments to
#[async_trait]
pub trait ChainSimulator: Send + Sync {
    /// Gas fee in USD for paying `amount` in `symbol`
    async fn estimate_gas(
        &self,
        symbol: &str,
        amount: f64,
        config: &SimulationConfig,
    ) -> Result<f64, SimulationError>;

    /// Submit a payment, returning the transaction hash or an injected failure
    async fn initiate_payment(
        &self,
        amount: f64,
        currency: &CryptoCurrency,
        recipient: &str,
        config: &SimulationConfig,
    ) -> Result<String, SimulationError>;

    /// Wait out a full confirmation run and return the block receipt
    async fn confirm_transaction(
        &self,
        tx_hash: &str,
        currency: &CryptoCurrency,
        required: u32,
        config: &SimulationConfig,
    ) -> Result<BlockReceipt, SimulationError>;

    /// Produce the receipt of a transaction whose confirmations were
    /// counted elsewhere
    fn block_receipt(&self, tx_hash: &str, currency: &CryptoCurrency, confirmations: u32)
        -> BlockReceipt;

    /// Get the name of the simulator
    fn name(&self) -> &str;

    /// Ticker pacing `required` confirmations at the configured speed
    fn confirmation_ticker(&self, config: &SimulationConfig, required: u32) -> ConfirmationTicker {
        ConfirmationTicker::from_config(config, required)
    }
}
