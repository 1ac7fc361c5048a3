//! Transaction status machine
//!
//! ```text
//! pending ──> failed
//!    │
//!    └──> confirming ──> confirmed ──> approved | rejected | flagged
//! ```
//!
//! Failed, approved, rejected and flagged are terminal. A confirming
//! transaction never records the full confirmation count on its own; the
//! final count arrives together with the block receipt in
//! [`TransactionLifecycle::mark_confirmed`].

use crate::policies::ReviewAction;
use simulator::BlockReceipt;
use types::{LifecycleError, Transaction, TransactionStatus};

/// Applies status transitions to transactions
pub struct TransactionLifecycle;

impl TransactionLifecycle {
    /// Move `tx` to `next` if the status machine allows it
    pub fn transition(tx: &mut Transaction, next: TransactionStatus) -> Result<(), LifecycleError> {
        if tx.status.is_terminal() {
            return Err(LifecycleError::TerminalState { status: tx.status });
        }
        if !tx.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: tx.status,
                to: next,
            });
        }

        tracing::debug!(id = %tx.id, from = %tx.status, to = %next, "Transaction status change");
        tx.status = next;
        Ok(())
    }

    /// The chain accepted the payment
    pub fn begin_confirming(tx: &mut Transaction, tx_hash: String) -> Result<(), LifecycleError> {
        if tx_hash.is_empty() {
            return Err(LifecycleError::MissingHash);
        }
        Self::transition(tx, TransactionStatus::Confirming)?;
        tx.tx_hash = Some(tx_hash);
        tx.confirmations = 0;
        Ok(())
    }

    /// The chain rejected the payment
    pub fn mark_failed(tx: &mut Transaction) -> Result<(), LifecycleError> {
        Self::transition(tx, TransactionStatus::Failed)
    }

    /// Store ticker progress. Counts never go backwards and stay one short
    /// of the threshold until the transaction is confirmed.
    pub fn record_confirmation(tx: &mut Transaction, confirmations: u32) -> Result<u32, LifecycleError> {
        if tx.status != TransactionStatus::Confirming {
            return Err(LifecycleError::InvalidTransition {
                from: tx.status,
                to: TransactionStatus::Confirming,
            });
        }
        let ceiling = tx.required_confirmations.saturating_sub(1);
        tx.confirmations = tx.confirmations.max(confirmations.min(ceiling));
        Ok(tx.confirmations)
    }

    /// Attach the block receipt and finish confirmation
    pub fn mark_confirmed(tx: &mut Transaction, receipt: &BlockReceipt) -> Result<(), LifecycleError> {
        if tx.tx_hash.is_none() {
            return Err(LifecycleError::MissingHash);
        }
        Self::transition(tx, TransactionStatus::Confirmed)?;
        tx.confirmations = receipt.confirmations.max(tx.required_confirmations);
        tx.gas_used = Some(receipt.gas_used);
        tx.gas_price = Some(receipt.gas_price);
        tx.block_number = Some(receipt.block_number);
        tx.confirmed_at = Some(receipt.confirmed_at);
        Ok(())
    }

    /// Administrator review of a confirmed transaction
    pub fn review(
        tx: &mut Transaction,
        action: ReviewAction,
        notes: Option<String>,
    ) -> Result<TransactionStatus, LifecycleError> {
        let target = action.target_status();
        if tx.status != TransactionStatus::Confirmed {
            if tx.status.is_terminal() {
                return Err(LifecycleError::TerminalState { status: tx.status });
            }
            return Err(LifecycleError::InvalidTransition {
                from: tx.status,
                to: target,
            });
        }

        let notes = notes.filter(|n| !n.trim().is_empty());
        if action == ReviewAction::Flag && notes.is_none() {
            return Err(LifecycleError::NotesRequired);
        }

        Self::transition(tx, target)?;
        if notes.is_some() {
            tx.admin_notes = notes;
        }
        tracing::info!(id = %tx.id, action = %action, "Transaction reviewed");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forger::TransactionForger;
    use chrono::Utc;
    use types::{CurrencyTable, PaymentQuote, PaymentSubmission, TransactionType};

    const HASH: &str = "0x8d7e9f2a1c4b5e8a7f9d2c5e8b1a4d7e9f2c5a8b1e4d7f9c2a5e8b1d4f7a9c21";

    fn pending() -> Transaction {
        let submission = PaymentSubmission {
            student_id: "STU2024001".to_string(),
            usd_amount: 6000.0,
            currency: "ETH".to_string(),
            tx_type: TransactionType::Tuition,
            description: None,
            recipient: None,
        };
        let eth = CurrencyTable::get("ETH").unwrap();
        let quote = PaymentQuote::new(6000.0, "ETH", 2.5, 25.0);
        TransactionForger::new().forge_pending(&submission, "Alice Smith", eth, &quote)
    }

    fn receipt(confirmations: u32) -> BlockReceipt {
        BlockReceipt {
            tx_hash: HASH.to_string(),
            block_number: 18_500_000,
            gas_used: 21_000,
            gas_price: 25.0,
            confirmations,
            confirmed_at: Utc::now(),
        }
    }

    fn confirmed() -> Transaction {
        let mut tx = pending();
        TransactionLifecycle::begin_confirming(&mut tx, HASH.to_string()).unwrap();
        TransactionLifecycle::mark_confirmed(&mut tx, &receipt(6)).unwrap();
        tx
    }

    #[test]
    fn test_happy_path() {
        let mut tx = pending();
        TransactionLifecycle::begin_confirming(&mut tx, HASH.to_string()).unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirming);
        assert_eq!(tx.tx_hash.as_deref(), Some(HASH));

        for n in 1..=6 {
            TransactionLifecycle::record_confirmation(&mut tx, n).unwrap();
        }
        assert_eq!(tx.confirmations, 5);
        assert_eq!(tx.status, TransactionStatus::Confirming);

        TransactionLifecycle::mark_confirmed(&mut tx, &receipt(6)).unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.confirmations, 6);
        assert_eq!(tx.gas_used, Some(21_000));
        assert_eq!(tx.block_number, Some(18_500_000));
        assert!(tx.confirmed_at.is_some());
    }

    #[test]
    fn test_confirmations_never_decrease() {
        let mut tx = pending();
        TransactionLifecycle::begin_confirming(&mut tx, HASH.to_string()).unwrap();
        TransactionLifecycle::record_confirmation(&mut tx, 3).unwrap();
        assert_eq!(TransactionLifecycle::record_confirmation(&mut tx, 2).unwrap(), 3);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut tx = pending();
        TransactionLifecycle::mark_failed(&mut tx).unwrap();

        for next in TransactionStatus::ALL {
            assert_eq!(
                TransactionLifecycle::transition(&mut tx, next),
                Err(LifecycleError::TerminalState {
                    status: TransactionStatus::Failed
                })
            );
        }
        assert!(TransactionLifecycle::begin_confirming(&mut tx, HASH.to_string()).is_err());
    }

    #[test]
    fn test_invalid_shortcuts() {
        let mut tx = pending();
        assert_eq!(
            TransactionLifecycle::transition(&mut tx, TransactionStatus::Confirmed),
            Err(LifecycleError::InvalidTransition {
                from: TransactionStatus::Pending,
                to: TransactionStatus::Confirmed
            })
        );
        assert_eq!(
            TransactionLifecycle::mark_confirmed(&mut tx, &receipt(6)),
            Err(LifecycleError::MissingHash)
        );
        assert!(TransactionLifecycle::record_confirmation(&mut tx, 1).is_err());
        assert_eq!(
            TransactionLifecycle::begin_confirming(&mut tx, String::new()),
            Err(LifecycleError::MissingHash)
        );
    }

    #[test]
    fn test_review_outcomes() {
        for (action, status) in [
            (ReviewAction::Approve, TransactionStatus::Approved),
            (ReviewAction::Reject, TransactionStatus::Rejected),
            (ReviewAction::Flag, TransactionStatus::Flagged),
        ] {
            let mut tx = confirmed();
            let result =
                TransactionLifecycle::review(&mut tx, action, Some("Checked".to_string()));
            assert_eq!(result, Ok(status));
            assert_eq!(tx.admin_notes.as_deref(), Some("Checked"));

            assert!(TransactionLifecycle::review(&mut tx, ReviewAction::Approve, None).is_err());
        }
    }

    #[test]
    fn test_flag_requires_notes() {
        let mut tx = confirmed();
        assert_eq!(
            TransactionLifecycle::review(&mut tx, ReviewAction::Flag, Some("   ".to_string())),
            Err(LifecycleError::NotesRequired)
        );
        assert_eq!(tx.status, TransactionStatus::Confirmed);

        assert_eq!(
            TransactionLifecycle::review(&mut tx, ReviewAction::Approve, None),
            Ok(TransactionStatus::Approved)
        );
        assert!(tx.admin_notes.is_none());
    }

    #[test]
    fn test_review_requires_confirmed() {
        let mut tx = pending();
        assert_eq!(
            TransactionLifecycle::review(&mut tx, ReviewAction::Approve, None),
            Err(LifecycleError::InvalidTransition {
                from: TransactionStatus::Pending,
                to: TransactionStatus::Approved
            })
        );
    }
}
