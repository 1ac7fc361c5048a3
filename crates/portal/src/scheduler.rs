//! Background task scheduler

use crate::app::AppState;
use anyhow::Result;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Periodic status reports
#[derive(Clone)]
pub struct Scheduler {
    state: Arc<AppState>,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown: CancellationToken::new(),
        }
    }

    /// Run until [`Scheduler::shutdown`] is called
    pub async fn run(&self) -> Result<()> {
        let period = Duration::from_secs(self.state.config.scheduler.status_interval_seconds.max(1));
        let mut status_interval = interval(period);
        status_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Scheduler stopped");
                    return Ok(());
                }
                _ = status_interval.tick() => {
                    self.report_status().await;
                }
            }
        }
    }

    pub fn shutdown(&self) {
        tracing::info!("Scheduler shutdown initiated");
        self.shutdown.cancel();
    }

    /// Log running tickers and stored transaction counts; warn on any
    /// transaction that broke the consistency rules
    async fn report_status(&self) {
        let active = self.state.tickers.active_ids().await;
        let counts = self.state.store.status_counts().await;
        let unread = self.state.store.unread_count().await;

        tracing::info!(
            active_tickers = active.len(),
            transactions = ?counts,
            unread_notifications = unread,
            uptime_seconds = self.state.uptime_seconds(),
            "Portal status"
        );
        if !active.is_empty() {
            tracing::debug!(ids = ?active, "Confirming transactions");
        }

        for violation in self.state.store.audit().await {
            tracing::warn!(error = %violation, "Consistency check failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;
        let scheduler = Scheduler::new(state);

        let task = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run().await })
        };
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(!task.is_finished());

        scheduler.shutdown();
        task.await.unwrap().unwrap();
    }
}
