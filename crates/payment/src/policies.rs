//! Review actions and transaction consistency rules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use types::{LifecycleError, Transaction, TransactionStatus};

/// Administrator decision on a confirmed payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
    Flag,
}

impl ReviewAction {
    /// Status a reviewed transaction ends in
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            ReviewAction::Approve => TransactionStatus::Approved,
            ReviewAction::Reject => TransactionStatus::Rejected,
            ReviewAction::Flag => TransactionStatus::Flagged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::Flag => "flag",
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(ReviewAction::Approve),
            "reject" => Ok(ReviewAction::Reject),
            "flag" => Ok(ReviewAction::Flag),
            _ => Err(format!("Unknown review action: {}", s)),
        }
    }
}

/// Cross-field rules every stored transaction satisfies
#[derive(Debug, Clone, Default)]
pub struct ConsistencyPolicy;

impl ConsistencyPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Check one transaction
    pub fn check(&self, tx: &Transaction) -> Result<(), LifecycleError> {
        let inconsistent = |message: String| LifecycleError::Inconsistent {
            id: tx.id.clone(),
            message,
        };

        if tx.is_fully_confirmed() && tx.required_confirmations > 0 && !tx.status.is_settled() {
            return Err(inconsistent(format!(
                "{}/{} confirmations but status is {}",
                tx.confirmations, tx.required_confirmations, tx.status
            )));
        }

        if tx.status.is_settled() && !tx.is_fully_confirmed() {
            return Err(inconsistent(format!(
                "status {} with only {}/{} confirmations",
                tx.status, tx.confirmations, tx.required_confirmations
            )));
        }

        let needs_hash = !matches!(
            tx.status,
            TransactionStatus::Pending | TransactionStatus::Failed
        );
        if needs_hash && tx.tx_hash.is_none() {
            return Err(inconsistent(format!("status {} without a hash", tx.status)));
        }

        if let Some(hash) = &tx.tx_hash {
            if !types::utils::is_valid_tx_hash(hash) {
                return Err(inconsistent(format!("malformed hash {}", hash)));
            }
        }

        if !tx.amount.is_finite() || tx.amount <= 0.0 || !tx.usd_value.is_finite() || tx.usd_value <= 0.0 {
            return Err(inconsistent("amounts must be positive".to_string()));
        }

        Ok(())
    }

    /// Check many transactions, collecting every violation
    pub fn check_all<'a, I>(&self, transactions: I) -> Vec<LifecycleError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .filter_map(|tx| self.check(tx).err())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::{CurrencyTable, TransactionType};

    fn confirmed(confirmations: u32) -> Transaction {
        Transaction {
            id: "tx_001".to_string(),
            student_id: "STU2024001".to_string(),
            student_name: "Alice Smith".to_string(),
            amount: 2.5,
            currency: CurrencyTable::get("ETH").unwrap().clone(),
            usd_value: 6000.0,
            tx_hash: Some(format!("0x{}", "ab".repeat(32))),
            status: TransactionStatus::Confirmed,
            tx_type: TransactionType::Tuition,
            description: "Fall 2024 Tuition".to_string(),
            gas_used: Some(21000),
            gas_price: Some(25.0),
            block_number: Some(18954321),
            confirmations,
            required_confirmations: 6,
            created_at: Utc::now(),
            confirmed_at: Some(Utc::now()),
            receipt_hash: None,
            admin_notes: None,
        }
    }

    #[test]
    fn test_review_action_parsing() {
        assert_eq!("approve".parse::<ReviewAction>().unwrap(), ReviewAction::Approve);
        assert_eq!("FLAG".parse::<ReviewAction>().unwrap(), ReviewAction::Flag);
        assert!("cancel".parse::<ReviewAction>().is_err());
        assert_eq!(ReviewAction::Reject.target_status(), TransactionStatus::Rejected);
    }

    #[test]
    fn test_extra_confirmations_are_consistent() {
        let policy = ConsistencyPolicy::new();
        assert!(policy.check(&confirmed(12)).is_ok());
        assert!(policy.check(&confirmed(6)).is_ok());
    }

    #[test]
    fn test_threshold_requires_settled_status() {
        let policy = ConsistencyPolicy::new();
        let mut tx = confirmed(6);
        tx.status = TransactionStatus::Confirming;
        assert!(matches!(
            policy.check(&tx),
            Err(LifecycleError::Inconsistent { .. })
        ));

        let mut tx = confirmed(3);
        tx.status = TransactionStatus::Approved;
        assert!(policy.check(&tx).is_err());
    }

    #[test]
    fn test_hash_required_after_pending() {
        let policy = ConsistencyPolicy::new();
        let mut tx = confirmed(6);
        tx.tx_hash = None;
        assert!(policy.check(&tx).is_err());

        tx.status = TransactionStatus::Failed;
        tx.confirmations = 0;
        assert!(policy.check(&tx).is_ok());

        let errors = policy.check_all([&confirmed(6), &confirmed(1)]);
        assert_eq!(errors.len(), 1);
    }
}
