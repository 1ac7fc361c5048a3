//! Mock browser wallet

use crate::failure::FailureInjector;
use crate::hash::generate_signature;
use config::{LatencyConfig, WalletConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use types::{WalletConnection, WalletError};

/// Signature request shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub to: String,
    pub value: f64,
    pub currency: String,
}

/// Wallet with one session at a time. Every successful connection returns
/// the configured mock address with a fresh random balance.
#[derive(Debug)]
pub struct WalletSimulator {
    config: WalletConfig,
    latency: LatencyConfig,
    session: RwLock<Option<WalletConnection>>,
}

impl WalletSimulator {
    pub fn new(config: WalletConfig, latency: LatencyConfig) -> Self {
        Self {
            config,
            latency,
            session: RwLock::new(None),
        }
    }

    pub async fn connect(&self) -> Result<WalletConnection, WalletError> {
        sleep_ms(self.latency.wallet_connect_ms).await;

        let connection = {
            let mut rng = rand::thread_rng();
            if FailureInjector::new(self.config.connect_failure_rate).should_fail(&mut rng) {
                None
            } else {
                Some(WalletConnection {
                    address: self.config.mock_address.clone(),
                    balance: rng.gen_range(1.0..11.0),
                    network: self.config.network_name.clone(),
                    connected: true,
                })
            }
        };

        let Some(connection) = connection else {
            tracing::warn!("Simulated wallet connection failed");
            return Err(WalletError::ConnectionFailed);
        };

        *self.session.write().await = Some(connection.clone());
        tracing::info!(
            address = %types::utils::sanitize_for_logging(&connection.address),
            network = %connection.network,
            "Wallet connected"
        );
        Ok(connection)
    }

    /// Sign a payment; the user may reject it
    pub async fn sign_transaction(&self, request: &SignRequest) -> Result<String, WalletError> {
        if !self.is_connected().await {
            return Err(WalletError::NotConnected);
        }

        sleep_ms(self.latency.wallet_sign_ms).await;

        let signature = {
            let mut rng = rand::thread_rng();
            if FailureInjector::new(self.config.sign_failure_rate).should_fail(&mut rng) {
                None
            } else {
                Some(generate_signature(&mut rng))
            }
        };

        match signature {
            Some(signature) => {
                tracing::debug!(to = %request.to, value = request.value, currency = %request.currency, "Transaction signed");
                Ok(signature)
            }
            None => {
                tracing::info!(to = %request.to, "User rejected signature request");
                Err(WalletError::UserRejected)
            }
        }
    }

    /// Switch to the chain with the given hex id, e.g. `0x1`
    pub async fn switch_network(&self, chain_id: &str) -> Result<(), WalletError> {
        let valid = chain_id
            .strip_prefix("0x")
            .map_or(false, |digits| {
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
            });
        if !valid {
            return Err(WalletError::InvalidChainId(chain_id.to_string()));
        }

        sleep_ms(self.latency.switch_network_ms).await;

        let failed = {
            let mut rng = rand::thread_rng();
            FailureInjector::new(self.config.switch_failure_rate).should_fail(&mut rng)
        };
        if failed {
            return Err(WalletError::NetworkSwitchFailed);
        }

        tracing::info!(chain_id, "Switched network");
        Ok(())
    }

    pub async fn disconnect(&self) {
        if self.session.write().await.take().is_some() {
            tracing::info!("Wallet disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn current(&self) -> Option<WalletConnection> {
        self.session.read().await.clone()
    }

    pub async fn current_account(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|c| c.address.clone())
    }

    /// Address payments are sent to when no recipient is given
    pub fn treasury_address(&self) -> &str {
        &self.config.treasury_address
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
