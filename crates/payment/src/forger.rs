//! Pending transaction forging

use chrono::Utc;
use types::{
    CryptoCurrency, PaymentQuote, PaymentSubmission, Transaction, TransactionStatus,
    DEFAULT_REQUIRED_CONFIRMATIONS,
};

/// Builds transactions for quoted payments
#[derive(Debug, Clone)]
pub struct TransactionForger {
    required_confirmations: u32,
}

impl TransactionForger {
    pub fn new() -> Self {
        Self {
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
        }
    }

    pub fn with_required_confirmations(required_confirmations: u32) -> Self {
        Self {
            required_confirmations,
        }
    }

    /// New pending transaction without a hash. The description falls back
    /// to the label of the payment type.
    pub fn forge_pending(
        &self,
        submission: &PaymentSubmission,
        student_name: &str,
        currency: &CryptoCurrency,
        quote: &PaymentQuote,
    ) -> Transaction {
        let description = submission
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| submission.tx_type.label().to_string());

        Transaction {
            id: Self::new_id(),
            student_id: submission.student_id.clone(),
            student_name: student_name.to_string(),
            amount: quote.crypto_amount,
            currency: currency.clone(),
            usd_value: quote.usd_amount,
            tx_hash: None,
            status: TransactionStatus::Pending,
            tx_type: submission.tx_type,
            description,
            gas_used: None,
            gas_price: None,
            block_number: None,
            confirmations: 0,
            required_confirmations: self.required_confirmations,
            created_at: Utc::now(),
            confirmed_at: None,
            receipt_hash: None,
            admin_notes: None,
        }
    }

    /// `tx_<millis>_<8 hex>`
    fn new_id() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("tx_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
    }
}

impl Default for TransactionForger {
    fn default() -> Self {
        Self::new()
    }
}
