//! Confirmation ticker
//!
//! A ticker counts simulated block confirmations from zero up to a required
//! threshold, one per period, reporting each count to a progress callback.
//! Running tickers are always stoppable: [`ConfirmationTicker::spawn`] hands
//! back a [`TickerHandle`] that cancels the task when dropped unless it is
//! explicitly detached.

use config::{ConfirmationSpeed, SimulationConfig};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use types::SimulationError;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// How a ticker run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerOutcome {
    /// Reached the required count
    Completed { confirmations: u32 },
    /// Stopped early through its cancellation token
    Cancelled { confirmations: u32 },
}

/// Counts confirmations on a fixed period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationTicker {
    required: u32,
    period: Duration,
}

/// Handle to a spawned ticker
#[derive(Debug)]
pub struct TickerHandle {
    token: CancellationToken,
    join: Option<JoinHandle<TickerOutcome>>,
}

impl TickerOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TickerOutcome::Completed { .. })
    }

    pub fn confirmations(&self) -> u32 {
        match self {
            TickerOutcome::Completed { confirmations }
            | TickerOutcome::Cancelled { confirmations } => *confirmations,
        }
    }
}

impl ConfirmationTicker {
    /// Spread `total` evenly over `required` ticks
    pub fn new(required: u32, total: Duration) -> Self {
        let period = if required == 0 {
            MIN_PERIOD
        } else {
            (total / required).max(MIN_PERIOD)
        };
        Self { required, period }
    }

    pub fn for_speed(speed: ConfirmationSpeed, required: u32) -> Self {
        Self::new(required, speed.total_duration())
    }

    pub fn from_config(config: &SimulationConfig, required: u32) -> Self {
        Self::new(required, config.confirmation_delay())
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until the threshold or until `cancel` fires. The callback sees
    /// 1, 2, ..., required; nothing is reported after cancellation.
    pub async fn run<F>(&self, cancel: &CancellationToken, mut on_progress: F) -> TickerOutcome
    where
        F: FnMut(u32),
    {
        let mut confirmations = 0;
        if self.required == 0 {
            return TickerOutcome::Completed { confirmations };
        }

        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while confirmations < self.required {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(confirmations, required = self.required, "Confirmation ticker cancelled");
                    return TickerOutcome::Cancelled { confirmations };
                }
                _ = interval.tick() => {
                    confirmations += 1;
                    on_progress(confirmations);
                }
            }
        }

        TickerOutcome::Completed { confirmations }
    }

    /// Run on a background task
    pub fn spawn<F>(self, on_progress: F) -> TickerHandle
    where
        F: FnMut(u32) + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let join = tokio::spawn(async move { self.run(&task_token, on_progress).await });
        TickerHandle::new(token, join)
    }
}

impl TickerHandle {
    pub(crate) fn new(token: CancellationToken, join: JoinHandle<TickerOutcome>) -> Self {
        Self {
            token,
            join: Some(join),
        }
    }

    /// Ask the ticker to stop; it reports `Cancelled` at its next await
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |join| join.is_finished())
    }

    /// Token that stops this ticker
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Guard that stops the ticker when it goes out of scope
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Let the ticker outlive this handle. It can still be stopped through
    /// its cancellation token or the registry that started it.
    pub fn detach(mut self) {
        self.join.take();
    }

    /// Wait for the ticker to finish. Dropping this future early cancels
    /// the ticker.
    pub async fn wait(mut self) -> Result<TickerOutcome, SimulationError> {
        let result = match self.join.as_mut() {
            Some(join) => join.await,
            None => {
                return Err(SimulationError::TickerAborted(
                    "ticker handle already released".to_string(),
                ))
            }
        };
        self.join = None;
        result.map_err(|e| SimulationError::TickerAborted(e.to_string()))
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.token.cancel();
        }
    }
}
