//! Mock IPFS receipt storage

use crate::hash::generate_ipfs_cid;
use config::LatencyConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::ReceiptError;

/// Largest accepted receipt, 5MB
pub const MAX_RECEIPT_SIZE: u64 = 5 * 1024 * 1024;

pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Metadata of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub hash: String,
    pub size: u64,
    pub name: String,
}

/// Accepts receipts by metadata only; nothing is stored
#[derive(Debug, Clone)]
pub struct ReceiptStorageSimulator {
    upload_ms: u64,
    verify_ms: u64,
}

impl ReceiptStorageSimulator {
    pub fn new(latency: &LatencyConfig) -> Self {
        Self {
            upload_ms: latency.receipt_upload_ms,
            verify_ms: latency.receipt_verify_ms,
        }
    }

    /// Check type and size, then hand out a random CID
    pub async fn upload_receipt(
        &self,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<UploadResult, ReceiptError> {
        if file_name.trim().is_empty() {
            return Err(ReceiptError::EmptyFileName);
        }
        if !is_accepted_content_type(content_type) {
            return Err(ReceiptError::UnsupportedFileType {
                content_type: content_type.to_string(),
            });
        }
        if size > MAX_RECEIPT_SIZE {
            return Err(ReceiptError::FileTooLarge {
                size,
                max: MAX_RECEIPT_SIZE,
            });
        }

        sleep_ms(self.upload_ms).await;

        let hash = generate_ipfs_cid(&mut rand::thread_rng());
        tracing::info!(file_name, size, hash = %hash, "Receipt uploaded");
        Ok(UploadResult {
            hash,
            size,
            name: file_name.to_string(),
        })
    }

    /// A hash verifies when it looks like a CIDv0 (`Qm`) or CIDv1 (`baf`)
    pub async fn verify_receipt(&self, hash: &str) -> bool {
        sleep_ms(self.verify_ms).await;
        hash.starts_with("Qm") || hash.starts_with("baf")
    }

    pub fn gateway_url(hash: &str) -> String {
        format!("{}/{}", IPFS_GATEWAY, hash)
    }
}

fn is_accepted_content_type(content_type: &str) -> bool {
    content_type == "application/pdf" || content_type.starts_with("image/")
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> ReceiptStorageSimulator {
        ReceiptStorageSimulator::new(&LatencyConfig::instant())
    }

    #[tokio::test]
    async fn test_upload_accepts_pdf_and_images() {
        let storage = storage();
        for content_type in ["application/pdf", "image/png", "image/jpeg"] {
            let result = storage
                .upload_receipt("receipt.pdf", content_type, 1024)
                .await
                .unwrap();
            assert!(result.hash.starts_with("bafybeif"));
            assert_eq!(result.size, 1024);
            assert_eq!(result.name, "receipt.pdf");
            assert!(storage.verify_receipt(&result.hash).await);
        }
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let storage = storage();
        assert_eq!(
            storage.upload_receipt("a.txt", "text/plain", 10).await,
            Err(ReceiptError::UnsupportedFileType {
                content_type: "text/plain".to_string()
            })
        );
        assert_eq!(
            storage
                .upload_receipt("big.pdf", "application/pdf", MAX_RECEIPT_SIZE + 1)
                .await,
            Err(ReceiptError::FileTooLarge {
                size: MAX_RECEIPT_SIZE + 1,
                max: MAX_RECEIPT_SIZE
            })
        );
        assert_eq!(
            storage.upload_receipt("  ", "application/pdf", 1).await,
            Err(ReceiptError::EmptyFileName)
        );
        assert!(storage
            .upload_receipt("edge.pdf", "application/pdf", MAX_RECEIPT_SIZE)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_verify_and_gateway() {
        let storage = storage();
        assert!(storage.verify_receipt("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").await);
        assert!(!storage.verify_receipt("0xdeadbeef").await);
        assert_eq!(
            ReceiptStorageSimulator::gateway_url("Qmabc"),
            "https://ipfs.io/ipfs/Qmabc"
        );
    }
}
