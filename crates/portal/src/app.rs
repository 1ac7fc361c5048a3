//! Main application structure and lifecycle management

use crate::{api::ApiServer, scheduler::Scheduler, session::SessionStore, storage::PortalStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use config::{Config, SimulationConfig, SimulationConfigUpdate};
use payment::{PaymentCalculator, TransactionForger};
use simulator::{ChainSimulator, MockChain, ReceiptStorageSimulator, TickerRegistry, WalletSimulator};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Shared state behind every handler
pub struct AppState {
    pub config: Config,
    simulation: RwLock<SimulationConfig>,
    pub chain: Arc<dyn ChainSimulator>,
    pub wallet: WalletSimulator,
    pub receipt_storage: ReceiptStorageSimulator,
    pub tickers: TickerRegistry,
    pub store: PortalStore,
    pub session: SessionStore,
    pub calculator: PaymentCalculator,
    pub forger: TransactionForger,
    pub started_at: DateTime<Utc>,
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    api_server: ApiServer,
    scheduler: Scheduler,
}

impl Application {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        let state = Arc::new(
            AppState::new(config)
                .await
                .context("Failed to initialize portal state")?,
        );

        let api_server = ApiServer::new(state.clone()).context("Failed to create API server")?;
        let scheduler = Scheduler::new(state.clone());

        info!("Application components initialized successfully");

        Ok(Self {
            state,
            api_server,
            scheduler,
        })
    }

    /// Run the API server and the scheduler. Returns once the server has
    /// drained after [`Application::shutdown`], or on the first error.
    pub async fn run(&self) -> Result<()> {
        let mut scheduler_handle = {
            let scheduler = self.scheduler.clone();
            tokio::spawn(async move { scheduler.run().await })
        };
        info!("Background scheduler started");

        info!(
            "Starting API server on {}:{}",
            self.state.config.server.host, self.state.config.server.port
        );

        let server = self.api_server.run();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                self.scheduler.shutdown();
                result.context("API server error")?;
            }
            result = &mut scheduler_handle => {
                result.context("Scheduler task error")??;
                // The scheduler only stops cleanly on shutdown; let the server drain
                server.await.context("API server error")?;
            }
        }

        Ok(())
    }

    /// Stop tickers, the scheduler and the server
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application...");

        let cancelled = self.state.tickers.cancel_all().await;
        info!(cancelled, "Confirmation tickers stopped");

        self.scheduler.shutdown();
        self.api_server.shutdown();

        info!("Application shutdown complete");
        Ok(())
    }
}

impl AppState {
    /// Seeded state backed by the mock chain
    pub async fn new(config: Config) -> types::Result<Self> {
        let chain: Arc<dyn ChainSimulator> = Arc::new(MockChain::new(config.latency.clone()));
        Self::with_chain(config, chain).await
    }

    /// Seeded state backed by a custom chain simulator
    pub async fn with_chain(config: Config, chain: Arc<dyn ChainSimulator>) -> types::Result<Self> {
        config.simulation.validate()?;

        let session = SessionStore::open(&config.storage.data_dir).await?;
        let store = PortalStore::seeded().await?;

        info!(
            chain = chain.name(),
            speed = config.simulation.confirmation_speed.as_str(),
            failure_rate = config.simulation.failure_rate,
            session = %session.path().display(),
            "Portal state ready"
        );

        Ok(Self {
            simulation: RwLock::new(config.simulation.clone()),
            wallet: WalletSimulator::new(config.wallet.clone(), config.latency.clone()),
            receipt_storage: ReceiptStorageSimulator::new(&config.latency),
            chain,
            tickers: TickerRegistry::new(),
            store,
            session,
            calculator: PaymentCalculator::new(),
            forger: TransactionForger::new(),
            started_at: Utc::now(),
            config,
        })
    }

    /// Snapshot of the current simulation settings
    pub async fn simulation(&self) -> SimulationConfig {
        self.simulation.read().await.clone()
    }

    /// Merge `update` into the current settings; nothing changes if the
    /// merged value is invalid
    pub async fn update_simulation(
        &self,
        update: &SimulationConfigUpdate,
    ) -> types::Result<SimulationConfig> {
        let mut current = self.simulation.write().await;
        let merged = current.merged(update)?;
        info!(
            speed = merged.confirmation_speed.as_str(),
            gas_multiplier = merged.gas_multiplier,
            volatility = merged.volatility_enabled,
            failure_rate = merged.failure_rate,
            "Simulation settings updated"
        );
        *current = merged.clone();
        Ok(merged)
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
