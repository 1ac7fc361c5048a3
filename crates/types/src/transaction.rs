//! Transaction types and the status state machine

use crate::currency::CryptoCurrency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a transaction, e.g. `tx_001`
pub type TransactionId = String;

/// Confirmations a payment needs before it counts as confirmed
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u32 = 6;

/// Status of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created, no hash yet
    Pending,
    /// Hash assigned, confirmations ticking
    Confirming,
    /// Reached the required confirmations
    Confirmed,
    /// Rejected by the mock chain
    Failed,
    /// Flagged by an administrator
    Flagged,
    /// Approved by an administrator
    Approved,
    /// Rejected by an administrator
    Rejected,
}

/// What the payment is for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Tuition,
    Fees,
    Housing,
    Books,
}

/// A simulated payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub student_id: String,
    pub student_name: String,
    /// Amount in units of `currency`
    pub amount: f64,
    pub currency: CryptoCurrency,
    pub usd_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub confirmations: u32,
    pub required_confirmations: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 7] = [
        TransactionStatus::Pending,
        TransactionStatus::Confirming,
        TransactionStatus::Confirmed,
        TransactionStatus::Failed,
        TransactionStatus::Flagged,
        TransactionStatus::Approved,
        TransactionStatus::Rejected,
    ];

    /// Convert status to string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirming => "confirming",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Flagged => "flagged",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Failed
                | TransactionStatus::Flagged
                | TransactionStatus::Approved
                | TransactionStatus::Rejected
        )
    }

    /// Statuses a fully confirmed transaction may carry
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Confirmed
                | TransactionStatus::Approved
                | TransactionStatus::Rejected
                | TransactionStatus::Flagged
        )
    }

    /// Whether `next` is reachable from `self` in one step
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Failed)
                | (Pending, Confirming)
                | (Confirming, Confirmed)
                | (Confirmed, Approved)
                | (Confirmed, Rejected)
                | (Confirmed, Flagged)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown transaction status: {}", s))
    }
}

impl TransactionType {
    /// Convert type to string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Tuition => "tuition",
            TransactionType::Fees => "fees",
            TransactionType::Housing => "housing",
            TransactionType::Books => "books",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Tuition => "Tuition Fee",
            TransactionType::Fees => "Administrative Fees",
            TransactionType::Housing => "Housing & Accommodation",
            TransactionType::Books => "Books & Materials",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tuition" => Ok(TransactionType::Tuition),
            "fees" => Ok(TransactionType::Fees),
            "housing" => Ok(TransactionType::Housing),
            "books" => Ok(TransactionType::Books),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        TransactionType::Tuition
    }
}

impl Transaction {
    /// Whether the confirmation counter reached the threshold
    pub fn is_fully_confirmed(&self) -> bool {
        self.confirmations >= self.required_confirmations
    }

    /// Confirmation progress in percent, capped at 100
    pub fn progress_percent(&self) -> f64 {
        if self.required_confirmations == 0 {
            return 100.0;
        }
        let confirmations = self.confirmations.min(self.required_confirmations);
        crate::utils::calculate_percentage(confirmations as u64, self.required_confirmations as u64)
    }

    /// Case-insensitive match on student name and description, exact
    /// substring match on hash and student id
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let lowered = term.to_lowercase();
        self.student_name.to_lowercase().contains(&lowered)
            || self.description.to_lowercase().contains(&lowered)
            || self.tx_hash.as_deref().is_some_and(|h| h.contains(term))
            || self.student_id.contains(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyTable;

    fn sample() -> Transaction {
        Transaction {
            id: "tx_test".to_string(),
            student_id: "STU2024001".to_string(),
            student_name: "Alice Smith".to_string(),
            amount: 2.5,
            currency: CurrencyTable::get("ETH").unwrap().clone(),
            usd_value: 6000.0,
            tx_hash: Some("0xabc123".to_string()),
            status: TransactionStatus::Confirming,
            tx_type: TransactionType::Tuition,
            description: "Spring 2024 Tuition Payment".to_string(),
            gas_used: None,
            gas_price: None,
            block_number: None,
            confirmations: 3,
            required_confirmations: 6,
            created_at: Utc::now(),
            confirmed_at: None,
            receipt_hash: None,
            admin_notes: None,
        }
    }

    #[test]
    fn test_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Confirming));
        assert!(Pending.can_transition_to(Failed));
        assert!(Confirming.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Flagged));
        assert!(!Pending.can_transition_to(Confirmed));
        assert!(!Confirming.can_transition_to(Approved));

        for terminal in [Failed, Flagged, Approved, Rejected] {
            assert!(terminal.is_terminal());
            for next in TransactionStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("confirming".parse::<TransactionStatus>(), Ok(TransactionStatus::Confirming));
        assert_eq!("FLAGGED".parse::<TransactionStatus>(), Ok(TransactionStatus::Flagged));
        assert!("settled".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_camel_case_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["studentId"], "STU2024001");
        assert_eq!(json["requiredConfirmations"], 6);
        assert_eq!(json["type"], "tuition");
        assert_eq!(json["status"], "confirming");
        assert_eq!(json["currency"]["usdPrice"], 2400.0);
        assert!(json.get("blockNumber").is_none());
    }

    #[test]
    fn test_progress_and_search() {
        let mut tx = sample();
        assert_eq!(tx.progress_percent(), 50.0);
        tx.confirmations = 12;
        assert_eq!(tx.progress_percent(), 100.0);
        assert!(tx.is_fully_confirmed());

        assert!(tx.matches_search("alice"));
        assert!(tx.matches_search("spring"));
        assert!(tx.matches_search("0xabc"));
        assert!(tx.matches_search("STU2024"));
        assert!(!tx.matches_search("bob"));
    }
}
