//! Registry of running confirmation tickers, keyed by transaction id

use crate::ticker::{ConfirmationTicker, TickerHandle, TickerOutcome};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use types::{SimulationError, TransactionId};

const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug)]
struct ActiveTicker {
    generation: u64,
    token: CancellationToken,
    /// Claimed once, either by the final confirmation or by a cancel
    state: Arc<AtomicU8>,
    started_at: DateTime<Utc>,
}

impl ActiveTicker {
    /// Stop the ticker unless its final confirmation already went out
    fn claim_cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.token.cancel();
        }
        won
    }
}

/// At most one ticker runs per transaction. Finished tickers remove
/// themselves; the registry can stop one or all of them until the final
/// confirmation has been reported.
#[derive(Debug, Clone, Default)]
pub struct TickerRegistry {
    active: Arc<Mutex<HashMap<TransactionId, ActiveTicker>>>,
    generation: Arc<AtomicU64>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `ticker` for `transaction_id`
    pub async fn start<F>(
        &self,
        transaction_id: &str,
        ticker: ConfirmationTicker,
        on_progress: F,
    ) -> Result<TickerHandle, SimulationError>
    where
        F: FnMut(u32) + Send + 'static,
    {
        let mut on_progress = on_progress;
        let mut active = self.active.lock().await;
        if active.contains_key(transaction_id) {
            return Err(SimulationError::TickerAlreadyRunning {
                transaction_id: transaction_id.to_string(),
            });
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let state = Arc::new(AtomicU8::new(RUNNING));
        active.insert(
            transaction_id.to_string(),
            ActiveTicker {
                generation,
                token: token.clone(),
                state: state.clone(),
                started_at: Utc::now(),
            },
        );

        let registry = self.active.clone();
        let task_token = token.clone();
        let id = transaction_id.to_string();
        let required = ticker.required();
        let join = tokio::spawn(async move {
            let claim = state.clone();
            let outcome = ticker
                .run(&task_token, move |n| {
                    if n < required || claim_finish(&claim) {
                        on_progress(n);
                    }
                })
                .await;
            let outcome = match outcome {
                TickerOutcome::Completed { .. } if !claim_finish(&state) => {
                    TickerOutcome::Cancelled {
                        confirmations: required.saturating_sub(1),
                    }
                }
                other => other,
            };
            let mut active = registry.lock().await;
            if active.get(&id).map(|t| t.generation) == Some(generation) {
                active.remove(&id);
            }
            outcome
        });

        tracing::debug!(
            transaction_id,
            required = ticker.required(),
            period_ms = ticker.period().as_millis() as u64,
            "Started confirmation ticker"
        );

        Ok(TickerHandle::new(token, join))
    }

    /// Stop the ticker of one transaction; false if none was running or it
    /// already reported its final confirmation
    pub async fn cancel(&self, transaction_id: &str) -> bool {
        let mut active = self.active.lock().await;
        match active.get(transaction_id) {
            Some(entry) if entry.claim_cancel() => {
                let started_at = entry.started_at;
                active.remove(transaction_id);
                let running_ms = (Utc::now() - started_at).num_milliseconds();
                tracing::info!(transaction_id, running_ms, "Cancelled confirmation ticker");
                true
            }
            _ => false,
        }
    }

    /// Stop every running ticker, returning how many were stopped
    pub async fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.active.lock().await.drain().collect();
        let cancelled = drained
            .iter()
            .filter(|(_, entry)| entry.claim_cancel())
            .count();
        if cancelled > 0 {
            tracing::info!(count = cancelled, "Cancelled all confirmation tickers");
        }
        cancelled
    }

    pub async fn is_active(&self, transaction_id: &str) -> bool {
        self.active.lock().await.contains_key(transaction_id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Running transaction ids, oldest first
    pub async fn active_ids(&self) -> Vec<TransactionId> {
        let active = self.active.lock().await;
        let mut entries: Vec<_> = active
            .iter()
            .map(|(id, entry)| (entry.generation, id.clone()))
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, id)| id).collect()
    }
}

fn claim_finish(state: &AtomicU8) -> bool {
    match state.compare_exchange(RUNNING, FINISHED, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => true,
        Err(current) => current == FINISHED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::TickerOutcome;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn ticker() -> ConfirmationTicker {
        ConfirmationTicker::new(4, Duration::from_secs(4))
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_is_rejected() {
        let registry = TickerRegistry::new();
        let first = registry.start("tx_1", ticker(), |_| {}).await.unwrap();

        let err = registry.start("tx_1", ticker(), |_| {}).await.unwrap_err();
        assert_eq!(
            err,
            SimulationError::TickerAlreadyRunning {
                transaction_id: "tx_1".to_string()
            }
        );

        registry.start("tx_2", ticker(), |_| {}).await.unwrap().detach();
        assert_eq!(registry.active_count().await, 2);
        assert_eq!(registry.active_ids().await, vec!["tx_1", "tx_2"]);
        first.detach();
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_ticker_leaves_registry() {
        let registry = TickerRegistry::new();
        let handle = registry.start("tx_1", ticker(), |_| {}).await.unwrap();
        assert!(registry.is_active("tx_1").await);

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome, TickerOutcome::Completed { confirmations: 4 });

        tokio::task::yield_now().await;
        assert!(!registry.is_active("tx_1").await);

        // Same transaction can be ticked again once finished
        registry.start("tx_1", ticker(), |_| {}).await.unwrap().detach();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_by_id() {
        let registry = TickerRegistry::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        registry
            .start("tx_1", ticker(), move |n| sink.lock().unwrap().push(n))
            .await
            .unwrap()
            .detach();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(registry.cancel("tx_1").await);
        assert!(!registry.cancel("tx_1").await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_final_confirmation_is_refused() {
        let registry = TickerRegistry::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = registry
            .start("tx_1", ticker(), move |n| sink.lock().unwrap().push(n))
            .await
            .unwrap();

        // Hold the registry lock so the finished task cannot remove itself
        let active = registry.active.lock().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
        assert!(active.contains_key("tx_1"));
        drop(active);

        assert!(!registry.cancel("tx_1").await);
        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome, TickerOutcome::Completed { confirmations: 4 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_final_confirmation() {
        let registry = TickerRegistry::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = registry
            .start("tx_1", ticker(), move |n| sink.lock().unwrap().push(n))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        // The claim is taken before the token is observed by the ticker
        let entry_state = registry.active.lock().await["tx_1"].state.clone();
        entry_state.store(CANCELLED, Ordering::Release);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome, TickerOutcome::Cancelled { confirmations: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let registry = TickerRegistry::new();
        let mut handles = Vec::new();
        for id in ["a", "b", "c"] {
            handles.push(registry.start(id, ticker(), |_| {}).await.unwrap());
        }

        assert_eq!(registry.cancel_all().await, 3);
        assert_eq!(registry.active_count().await, 0);

        for handle in handles {
            let outcome = handle.wait().await.unwrap();
            assert!(!outcome.is_completed());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_task_does_not_evict_restarted_entry() {
        let registry = TickerRegistry::new();
        let old = registry.start("tx_1", ticker(), |_| {}).await.unwrap();
        registry.cancel("tx_1").await;

        let new = registry.start("tx_1", ticker(), |_| {}).await.unwrap();
        old.wait().await.unwrap();
        tokio::task::yield_now().await;

        assert!(registry.is_active("tx_1").await);
        new.cancel();
    }
}
