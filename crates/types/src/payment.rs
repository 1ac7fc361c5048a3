//! Payment-related types and structures

use crate::transaction::TransactionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An outstanding amount the university has billed a student for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub student_id: String,
    /// Amount in `currency` (fiat, usually USD)
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    pub due_date: DateTime<Utc>,
}

/// Conversion of a USD amount into a crypto amount plus fees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    /// Amount billed in USD
    pub usd_amount: f64,
    /// Currency symbol the student pays with
    pub currency: String,
    /// `usd_amount / usd_price`
    pub crypto_amount: f64,
    /// Estimated gas fee in USD
    pub gas_fee_usd: f64,
    /// `usd_amount + gas_fee_usd`
    pub total_usd: f64,
    pub quoted_at: DateTime<Utc>,
}

/// Payment submission from a student
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmission {
    pub student_id: String,
    pub usd_amount: f64,
    pub currency: String,
    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
    /// Recipient wallet; defaults to the university treasury
    #[serde(default)]
    pub recipient: Option<String>,
}

impl PaymentQuote {
    pub fn new(usd_amount: f64, currency: &str, crypto_amount: f64, gas_fee_usd: f64) -> Self {
        Self {
            usd_amount,
            currency: currency.to_string(),
            crypto_amount,
            gas_fee_usd,
            total_usd: usd_amount + gas_fee_usd,
            quoted_at: Utc::now(),
        }
    }
}
