//! Payment submission and confirmation tracking

use crate::app::AppState;
use config::SimulationConfig;
use payment::{PaymentCalculator, ReviewAction, TransactionLifecycle};
use serde::Serialize;
use simulator::{SignRequest, TickerHandle, TickerOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use types::utils::{format_crypto, format_usd, is_valid_address, sanitize_for_logging};
use types::{
    CryptoCurrency, LifecycleError, Notification, NotificationType, PaymentQuote,
    PaymentSubmission, PortalError, Result, Transaction,
};

/// Quote plus the price shown next to it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEstimate {
    #[serde(flatten)]
    pub quote: PaymentQuote,
    pub display_price: f64,
    pub currency_info: CryptoCurrency,
}

/// A submitted payment. `error` is set when the chain rejected it and the
/// transaction was stored as failed.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppState {
    pub async fn estimate_payment(&self, usd_amount: f64, symbol: &str) -> Result<PaymentEstimate> {
        let config = self.simulation().await;
        let currency = PaymentCalculator::currency(symbol)?;
        let quote = self
            .calculator
            .quote(self.chain.as_ref(), usd_amount, symbol, &config)
            .await?;

        Ok(PaymentEstimate {
            quote,
            display_price: self.calculator.display_price(currency, &config),
            currency_info: currency.clone(),
        })
    }

    /// Quote, store and submit a payment, then start counting confirmations
    pub async fn submit_payment(self: &Arc<Self>, submission: PaymentSubmission) -> Result<PaymentOutcome> {
        let currency = PaymentCalculator::currency(&submission.currency)?;
        let student = self
            .store
            .user_by_student_id(&submission.student_id)
            .await
            .ok_or_else(|| PortalError::not_found(format!("student {}", submission.student_id)))?;

        let recipient = match submission.recipient.as_deref() {
            Some(address) if !is_valid_address(address) => {
                return Err(PortalError::Validation(format!(
                    "Invalid recipient address: {}",
                    address
                )));
            }
            Some(address) => address.to_string(),
            None => self.wallet.treasury_address().to_string(),
        };

        let config = self.simulation().await;
        let quote = self
            .calculator
            .quote(self.chain.as_ref(), submission.usd_amount, &currency.symbol, &config)
            .await?;

        let pending = self
            .forger
            .forge_pending(&submission, &student.name, currency, &quote);
        let id = pending.id.clone();
        self.store.insert_transaction(pending).await?;

        info!(
            id = %id,
            student_id = %submission.student_id,
            usd = submission.usd_amount,
            amount = quote.crypto_amount,
            currency = %currency.symbol,
            "Payment submitted"
        );

        // A connected wallet has to sign before the payment reaches the chain
        let signed = if self.wallet.is_connected().await {
            let request = SignRequest {
                to: recipient.clone(),
                value: quote.crypto_amount,
                currency: currency.symbol.clone(),
            };
            self.wallet.sign_transaction(&request).await.map(|_| ())
        } else {
            Ok(())
        };
        let submitted = match signed {
            Ok(()) => self
                .chain
                .initiate_payment(quote.crypto_amount, currency, &recipient, &config)
                .await
                .map_err(PortalError::from),
            Err(e) => Err(PortalError::from(e)),
        };

        match submitted {
            Ok(tx_hash) => {
                let tx = self
                    .store
                    .update_transaction(&id, |tx| TransactionLifecycle::begin_confirming(tx, tx_hash))
                    .await?;
                self.start_confirmation(&tx, &config).await?;
                Ok(PaymentOutcome {
                    transaction: tx,
                    error: None,
                })
            }
            Err(err) => {
                let tx = self
                    .store
                    .update_transaction(&id, TransactionLifecycle::mark_failed)
                    .await?;
                warn!(id = %id, error = %err, "Payment rejected");

                self.store
                    .push_notification(
                        Notification::new(
                            "Payment Failed",
                            format!(
                                "{}'s {} payment of {} ({}) failed: {}",
                                student.name,
                                tx.tx_type.as_str(),
                                format_crypto(tx.amount, &tx.currency.symbol),
                                format_usd(tx.usd_value),
                                err
                            ),
                            NotificationType::Error,
                        )
                        .for_user(&student.id, &student.name),
                    )
                    .await;

                Ok(PaymentOutcome {
                    transaction: tx,
                    error: Some(err.to_string()),
                })
            }
        }
    }

    /// Spawn the ticker of a confirming transaction. Progress is written to
    /// the store as it arrives; the receipt is attached once the ticker
    /// completes.
    async fn start_confirmation(self: &Arc<Self>, tx: &Transaction, config: &SimulationConfig) -> Result<()> {
        let ticker = self.chain.confirmation_ticker(config, tx.required_confirmations);
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        let handle = self
            .tickers
            .start(&tx.id, ticker, move |confirmations| {
                let _ = progress_tx.send(confirmations);
            })
            .await?;

        let state = Arc::clone(self);
        let id = tx.id.clone();
        tokio::spawn(async move {
            // Closes once the ticker drops its callback
            while let Some(confirmations) = progress_rx.recv().await {
                let recorded = state
                    .store
                    .update_transaction(&id, |tx| {
                        TransactionLifecycle::record_confirmation(tx, confirmations).map(|_| ())
                    })
                    .await;
                match recorded {
                    Ok(tx) => debug!(id = %id, confirmations = tx.confirmations, "Confirmation recorded"),
                    Err(e) => warn!(id = %id, error = %e, "Dropping confirmation progress"),
                }
            }

            if let Err(e) = state.finish_confirmation(&id, handle).await {
                error!(id = %id, error = %e, "Failed to finish confirmation");
            }
        });

        Ok(())
    }

    async fn finish_confirmation(&self, id: &str, handle: TickerHandle) -> Result<()> {
        let confirmations = match handle.wait().await? {
            TickerOutcome::Completed { confirmations } => confirmations,
            TickerOutcome::Cancelled { confirmations } => {
                info!(id, confirmations, "Confirmation cancelled");
                return Ok(());
            }
        };

        let tx = self
            .store
            .update_transaction(id, |tx| {
                let tx_hash = tx.tx_hash.clone().ok_or(LifecycleError::MissingHash)?;
                let receipt = self.chain.block_receipt(&tx_hash, &tx.currency, confirmations);
                TransactionLifecycle::mark_confirmed(tx, &receipt)
            })
            .await?;

        info!(
            id,
            hash = %sanitize_for_logging(tx.tx_hash.as_deref().unwrap_or_default()),
            block = tx.block_number,
            confirmations = tx.confirmations,
            "Transaction confirmed"
        );

        let notification = Notification::new(
            "Payment Confirmed",
            format!(
                "{}'s {} payment of {} ({}) has been confirmed on the blockchain.",
                tx.student_name,
                tx.tx_type.as_str(),
                format_crypto(tx.amount, &tx.currency.symbol),
                format_usd(tx.usd_value)
            ),
            NotificationType::Success,
        );
        self.notify_student(&tx, notification).await;
        Ok(())
    }

    /// Stop the ticker of a confirming transaction. The transaction keeps
    /// its status and the confirmations counted so far.
    pub async fn cancel_confirmation(&self, id: &str) -> Result<Transaction> {
        self.store.transaction(id).await?;
        if !self.tickers.cancel(id).await {
            return Err(PortalError::Conflict(format!(
                "No confirmation in progress for transaction {}",
                id
            )));
        }
        self.store.transaction(id).await
    }

    /// Administrator review of a confirmed transaction
    pub async fn review_transaction(
        &self,
        id: &str,
        action: ReviewAction,
        notes: Option<String>,
    ) -> Result<Transaction> {
        let tx = self
            .store
            .update_transaction(id, |tx| {
                TransactionLifecycle::review(tx, action, notes).map(|_| ())
            })
            .await?;

        let (title, kind) = match action {
            ReviewAction::Approve => ("Transaction Approved", NotificationType::Success),
            ReviewAction::Reject => ("Transaction Rejected", NotificationType::Error),
            ReviewAction::Flag => ("Transaction Flagged", NotificationType::Warning),
        };
        let mut message = format!(
            "{}'s {} payment {} was marked {} by an administrator.",
            tx.student_name,
            tx.tx_type.as_str(),
            tx.id,
            tx.status
        );
        if let Some(notes) = &tx.admin_notes {
            message.push_str(&format!(" Notes: {}", notes));
        }
        self.notify_student(&tx, Notification::new(title, message, kind))
            .await;
        Ok(tx)
    }

    async fn notify_student(&self, tx: &Transaction, notification: Notification) {
        let notification = match self.store.user_by_student_id(&tx.student_id).await {
            Some(user) => notification.for_user(&user.id, &user.name),
            None => notification,
        };
        self.store.push_notification(notification).await;
    }
}

#[cfg(test)]
mod tests {
    use crate::app::testing;
    use crate::storage::NotificationFilter;
    use config::{ConfirmationSpeed, SimulationConfigUpdate};
    use payment::ReviewAction;
    use std::time::Duration;
    use tempfile::TempDir;
    use types::{
        LifecycleError, NotificationType, PaymentSubmission, PortalError, SimulationError,
        TransactionStatus, TransactionType,
    };

    fn submission(usd_amount: f64, currency: &str) -> PaymentSubmission {
        PaymentSubmission {
            student_id: "STU2024001".to_string(),
            usd_amount,
            currency: currency.to_string(),
            tx_type: TransactionType::Tuition,
            description: Some("Fall 2024 Tuition".to_string()),
            recipient: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimate_is_exact() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;

        let estimate = state.estimate_payment(6000.0, "ETH").await.unwrap();
        assert_eq!(estimate.quote.crypto_amount, 2.5);
        assert_eq!(estimate.quote.gas_fee_usd, 25.0);
        assert_eq!(estimate.quote.total_usd, 6025.0);
        assert_eq!(estimate.currency_info.symbol, "ETH");

        assert!(matches!(
            state.estimate_payment(100.0, "DOGE").await,
            Err(PortalError::Simulation(SimulationError::UnsupportedCurrency { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_confirms_after_ticker() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;

        let outcome = state.submit_payment(submission(6000.0, "ETH")).await.unwrap();
        assert!(outcome.error.is_none());
        let id = outcome.transaction.id.clone();
        assert_eq!(outcome.transaction.status, TransactionStatus::Confirming);
        assert_eq!(outcome.transaction.amount, 2.5);
        assert!(state.tickers.is_active(&id).await);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let tx = state.store.transaction(&id).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.confirmations, 6);
        assert_eq!(tx.gas_used, Some(21_000));
        assert!(!state.tickers.is_active(&id).await);

        let success = state
            .store
            .notifications(&NotificationFilter {
                kind: Some(NotificationType::Success),
                search: Some("2.500000 ETH".to_string()),
                ..NotificationFilter::default()
            })
            .await;
        assert_eq!(success.len(), 1);
        assert_eq!(success[0].user_id.as_deref(), Some("user_001"));
        assert!(success[0].message.contains("2.500000 ETH ($6000.00)"));
        assert!(state.store.audit().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_payment_is_stored_as_failed() {
        let dir = TempDir::new().unwrap();
        let mut config = testing::config(&dir);
        config.simulation.failure_rate = 1.0;
        let state = testing::state(config).await;

        let outcome = state.submit_payment(submission(100.0, "USDC")).await.unwrap();
        assert_eq!(outcome.transaction.status, TransactionStatus::Failed);
        assert!(outcome.transaction.tx_hash.is_none());
        assert_eq!(
            outcome.error.as_deref(),
            Some("Transaction failed: insufficient gas or network congestion")
        );
        assert_eq!(state.tickers.active_count().await, 0);

        let failures = state
            .store
            .notifications(&NotificationFilter {
                kind: Some(NotificationType::Error),
                read: Some(false),
                ..NotificationFilter::default()
            })
            .await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].title, "Payment Failed");
        assert!(failures[0].message.contains("($100.00)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_wallet_must_sign() {
        let dir = TempDir::new().unwrap();
        let mut config = testing::config(&dir);
        config.wallet.sign_failure_rate = 1.0;
        let state = testing::state(config).await;

        state.wallet.connect().await.unwrap();
        let outcome = state.submit_payment(submission(100.0, "USDC")).await.unwrap();
        assert_eq!(outcome.transaction.status, TransactionStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("User rejected transaction"));

        state.wallet.disconnect().await;
        let outcome = state.submit_payment(submission(100.0, "USDC")).await.unwrap();
        assert_eq!(outcome.transaction.status, TransactionStatus::Confirming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_validation() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;

        let mut unknown_student = submission(100.0, "ETH");
        unknown_student.student_id = "STU0000000".to_string();
        assert!(matches!(
            state.submit_payment(unknown_student).await,
            Err(PortalError::NotFound { .. })
        ));

        let mut bad_recipient = submission(100.0, "ETH");
        bad_recipient.recipient = Some("0x1234".to_string());
        assert!(matches!(
            state.submit_payment(bad_recipient).await,
            Err(PortalError::Validation(_))
        ));

        assert!(matches!(
            state.submit_payment(submission(-5.0, "ETH")).await,
            Err(PortalError::Simulation(SimulationError::InvalidAmount(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_keeps_confirming_status() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;
        state
            .update_simulation(&SimulationConfigUpdate {
                confirmation_speed: Some(ConfirmationSpeed::Slow),
                ..SimulationConfigUpdate::default()
            })
            .await
            .unwrap();

        let outcome = state.submit_payment(submission(43000.0, "BTC")).await.unwrap();
        let id = outcome.transaction.id;

        // Slow: one confirmation every 10s / 6
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let cancelled = state.cancel_confirmation(&id).await.unwrap();
        assert_eq!(cancelled.status, TransactionStatus::Confirming);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let tx = state.store.transaction(&id).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirming);
        assert_eq!(tx.confirmations, 2);

        assert!(matches!(
            state.cancel_confirmation(&id).await,
            Err(PortalError::Conflict(_))
        ));
        assert!(matches!(
            state.cancel_confirmation("tx_missing").await,
            Err(PortalError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_review_notifies_student() {
        let dir = TempDir::new().unwrap();
        let state = testing::state(testing::config(&dir)).await;

        assert!(matches!(
            state.review_transaction("tx_001", ReviewAction::Flag, None).await,
            Err(PortalError::Lifecycle(LifecycleError::NotesRequired))
        ));

        let tx = state
            .review_transaction("tx_001", ReviewAction::Flag, Some("Amount mismatch".to_string()))
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Flagged);

        let warnings = state
            .store
            .notifications(&NotificationFilter {
                kind: Some(NotificationType::Warning),
                user_id: Some("user_001".to_string()),
                ..NotificationFilter::default()
            })
            .await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("Amount mismatch"));

        assert!(matches!(
            state.review_transaction("tx_001", ReviewAction::Approve, None).await,
            Err(PortalError::Lifecycle(LifecycleError::TerminalState { .. }))
        ));
    }
}
