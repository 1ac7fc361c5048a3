//! Tuition Portal - Main Application Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use config::{ConfigLoader, LoggingConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod accounts;
mod api;
mod app;
mod payments;
mod receipts;
mod scheduler;
mod seed;
mod session;
mod storage;

use app::Application;

/// Simulated crypto tuition payment portal
#[derive(Debug, Parser)]
#[command(name = "portal", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = "config.yaml")]
    config: String,

    /// Log format override (json, pretty)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let args = Args::parse();

    let config = ConfigLoader::load_with_defaults(&args.config)
        .context("Failed to load configuration")?;

    init_logging(&config.logging, args.log_format.as_deref())?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Could not load .env file: {}", e),
    }

    info!("Starting Tuition Portal v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);
    info!(
        speed = config.simulation.confirmation_speed.as_str(),
        gas_multiplier = config.simulation.gas_multiplier,
        volatility = config.simulation.volatility_enabled,
        failure_rate = config.simulation.failure_rate,
        "Simulation settings"
    );

    let app = Application::new(config)
        .await
        .context("Failed to create application")?;

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for CTRL+C: {}", e),
        }
    };

    info!("Application starting...");
    let run = app.run();
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = shutdown_signal => {
            info!("Initiating graceful shutdown...");
            app.shutdown().await?;
            run.await
        }
    };
    if let Err(e) = result {
        tracing::error!("Application error: {}", e);
        return Err(e);
    }

    info!("Tuition Portal shutdown complete");
    Ok(())
}

/// Initialize logging from the config; RUST_LOG and `--log-format` win
fn init_logging(logging: &LoggingConfig, format_override: Option<&str>) -> Result<()> {
    let log_format = format_override.unwrap_or(&logging.format);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!("Logging initialized");
    info!("Log level: {}", logging.level);
    info!("Log format: {}", log_format);

    if logging.level == "trace" || logging.level == "debug" {
        warn!("Debug/trace logging enabled - may impact performance in production");
    }

    Ok(())
}
