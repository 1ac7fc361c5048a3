//! Receipt uploads on the mock IPFS

use crate::app::AppState;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use simulator::ReceiptStorageSimulator;
use tracing::info;
use types::{Notification, NotificationType, Receipt, Result};

/// Metadata of a file to upload; the content itself is never sent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptUpload {
    pub transaction_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReceipt {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub gateway_url: String,
}

impl From<Receipt> for StoredReceipt {
    fn from(receipt: Receipt) -> Self {
        Self {
            gateway_url: ReceiptStorageSimulator::gateway_url(&receipt.ipfs_hash),
            receipt,
        }
    }
}

impl AppState {
    /// Upload a receipt and link it to its transaction
    pub async fn upload_receipt(&self, upload: ReceiptUpload) -> Result<StoredReceipt> {
        let tx = self.store.transaction(&upload.transaction_id).await?;
        let uploaded = self
            .receipt_storage
            .upload_receipt(&upload.file_name, &upload.content_type, upload.size)
            .await?;

        let receipt = Receipt {
            id: format!("receipt_{}", uuid::Uuid::new_v4().simple()),
            transaction_id: tx.id.clone(),
            ipfs_hash: uploaded.hash.clone(),
            file_name: uploaded.name,
            uploaded_at: Utc::now(),
            verified: false,
        };
        self.store.insert_receipt(receipt.clone()).await;

        let hash = uploaded.hash;
        self.store
            .update_transaction(&tx.id, |tx| {
                tx.receipt_hash = Some(hash);
                Ok(())
            })
            .await?;

        let notification = Notification::new(
            "Receipt Uploaded",
            format!(
                "{} uploaded a new receipt for transaction {}.",
                tx.student_name, tx.id
            ),
            NotificationType::Info,
        );
        let notification = match self.store.user_by_student_id(&tx.student_id).await {
            Some(user) => notification.for_user(&user.id, &user.name),
            None => notification,
        };
        self.store.push_notification(notification).await;

        info!(receipt_id = %receipt.id, transaction_id = %tx.id, size = uploaded.size, "Receipt uploaded");
        Ok(receipt.into())
    }

    /// Ask the storage whether the CID resolves and record the answer
    pub async fn verify_receipt(&self, id: &str) -> Result<StoredReceipt> {
        let receipt = self.store.receipt(id).await?;
        let verified = self.receipt_storage.verify_receipt(&receipt.ipfs_hash).await;
        let receipt = self.store.set_receipt_verified(id, verified).await?;
        info!(receipt_id = %id, verified, "Receipt verification");
        Ok(receipt.into())
    }

    pub async fn delete_receipt(&self, id: &str) -> Result<Receipt> {
        let receipt = self.store.delete_receipt(id).await?;
        let remaining = self.store.receipts(Some(&receipt.transaction_id)).await;
        let latest = remaining.last().map(|r| r.ipfs_hash.clone());
        self.store
            .update_transaction(&receipt.transaction_id, |tx| {
                tx.receipt_hash = latest;
                Ok(())
            })
            .await?;
        Ok(receipt)
    }
}
