//! In-memory portal storage

use crate::seed;
use payment::ConsistencyPolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use types::{
    LifecycleError, Notification, NotificationType, PaymentRequest, PortalError, Receipt, Result,
    Transaction, TransactionStatus, TransactionType, User, UserRole,
};

/// Query filters for transaction listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub student_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<TransactionType>,
    pub search: Option<String>,
}

/// Query filters for user listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub verified: Option<bool>,
    pub search: Option<String>,
}

/// Query filters for notification listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub read: Option<bool>,
    pub user_id: Option<String>,
    pub search: Option<String>,
}

/// Users, transactions, notifications, receipts and payment requests.
/// Every transaction write passes the [`ConsistencyPolicy`].
#[derive(Debug, Default)]
pub struct PortalStore {
    users: RwLock<Vec<User>>,
    transactions: RwLock<Vec<Transaction>>,
    notifications: RwLock<Vec<Notification>>,
    receipts: RwLock<Vec<Receipt>>,
    payment_requests: RwLock<Vec<PaymentRequest>>,
    policy: ConsistencyPolicy,
}

impl TransactionFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        self.status.map_or(true, |s| tx.status == s)
            && self.tx_type.map_or(true, |t| tx.tx_type == t)
            && self
                .student_id
                .as_deref()
                .map_or(true, |id| tx.student_id == id)
            && self.search.as_deref().map_or(true, |term| tx.matches_search(term))
    }
}

impl UserFilter {
    fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |r| user.role == r)
            && self.verified.map_or(true, |v| user.is_verified == v)
            && self.search.as_deref().map_or(true, |term| user.matches_search(term))
    }
}

impl NotificationFilter {
    fn matches(&self, notification: &Notification) -> bool {
        self.kind.map_or(true, |k| notification.kind == k)
            && self.read.map_or(true, |r| notification.read == r)
            && self
                .user_id
                .as_deref()
                .map_or(true, |id| notification.user_id.as_deref() == Some(id))
            && self
                .search
                .as_deref()
                .map_or(true, |term| notification.matches_search(term))
    }
}

impl PortalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo accounts and history
    pub async fn seeded() -> Result<Self> {
        let store = Self::new();
        for user in seed::users() {
            store.insert_user(user).await?;
        }
        for tx in seed::transactions() {
            store.insert_transaction(tx).await?;
        }
        for notification in seed::notifications() {
            store.push_notification(notification).await;
        }
        *store.payment_requests.write().await = seed::payment_requests();
        Ok(store)
    }

    // Users

    pub async fn users(&self, filter: &UserFilter) -> Vec<User> {
        self.users
            .read()
            .await
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect()
    }

    pub async fn user(&self, id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| PortalError::not_found(format!("user {}", id)))
    }

    /// Exact email match
    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.iter().find(|u| u.email == email).cloned()
    }

    pub async fn user_by_student_id(&self, student_id: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.student_id.as_deref() == Some(student_id))
            .cloned()
    }

    pub async fn insert_user(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(PortalError::Conflict(format!("User {} already exists", user.id)));
        }
        Self::check_email_free(&users, &user.email, None)?;
        Self::check_student_id_free(&users, user.student_id.as_deref(), None)?;
        users.push(user);
        Ok(())
    }

    /// Apply `f` to a copy of the user; the change is kept only if the
    /// email and student id stay unique
    pub async fn update_user<F>(&self, id: &str, f: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| PortalError::not_found(format!("user {}", id)))?;

        let mut updated = users[index].clone();
        f(&mut updated);
        Self::check_email_free(&users, &updated.email, Some(id))?;
        Self::check_student_id_free(&users, updated.student_id.as_deref(), Some(id))?;
        users[index] = updated.clone();
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| PortalError::not_found(format!("user {}", id)))?;
        Ok(users.remove(index))
    }

    fn check_email_free(users: &[User], email: &str, except_id: Option<&str>) -> Result<()> {
        let taken = users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id.as_str()) != except_id);
        if taken {
            return Err(PortalError::Conflict(format!("Email {} is already registered", email)));
        }
        Ok(())
    }

    fn check_student_id_free(
        users: &[User],
        student_id: Option<&str>,
        except_id: Option<&str>,
    ) -> Result<()> {
        let Some(student_id) = student_id else {
            return Ok(());
        };
        let taken = users.iter().any(|u| {
            u.student_id.as_deref() == Some(student_id) && Some(u.id.as_str()) != except_id
        });
        if taken {
            return Err(PortalError::Conflict(format!(
                "Student ID {} is already assigned",
                student_id
            )));
        }
        Ok(())
    }

    // Transactions

    pub async fn insert_transaction(&self, tx: Transaction) -> Result<()> {
        self.policy.check(&tx)?;
        let mut transactions = self.transactions.write().await;
        if transactions.iter().any(|t| t.id == tx.id) {
            return Err(PortalError::Conflict(format!("Transaction {} already exists", tx.id)));
        }
        transactions.push(tx);
        Ok(())
    }

    pub async fn transaction(&self, id: &str) -> Result<Transaction> {
        self.transactions
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| PortalError::not_found(format!("transaction {}", id)))
    }

    /// Newest first
    pub async fn transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let mut found: Vec<_> = self
            .transactions
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    /// Apply a lifecycle step to a copy of the transaction and commit it if
    /// both the step and the consistency check succeed
    pub async fn update_transaction<F>(&self, id: &str, f: F) -> Result<Transaction>
    where
        F: FnOnce(&mut Transaction) -> std::result::Result<(), LifecycleError>,
    {
        let mut transactions = self.transactions.write().await;
        let slot = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PortalError::not_found(format!("transaction {}", id)))?;

        let mut updated = slot.clone();
        f(&mut updated)?;
        self.policy.check(&updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    /// Transaction count per status
    pub async fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for tx in self.transactions.read().await.iter() {
            *counts.entry(tx.status.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Consistency violations across all stored transactions
    pub async fn audit(&self) -> Vec<LifecycleError> {
        let transactions = self.transactions.read().await;
        self.policy.check_all(transactions.iter())
    }

    // Notifications

    pub async fn push_notification(&self, notification: Notification) {
        self.notifications.write().await.push(notification);
    }

    /// Newest first
    pub async fn notifications(&self, filter: &NotificationFilter) -> Vec<Notification> {
        let mut found: Vec<_> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<Notification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| PortalError::not_found(format!("notification {}", id)))?;
        notification.read = true;
        Ok(notification.clone())
    }

    /// Returns how many were unread
    pub async fn mark_all_notifications_read(&self) -> usize {
        let mut notifications = self.notifications.write().await;
        let mut changed = 0;
        for notification in notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub async fn delete_notification(&self, id: &str) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() == before {
            return Err(PortalError::not_found(format!("notification {}", id)));
        }
        Ok(())
    }

    pub async fn unread_count(&self) -> usize {
        self.notifications.read().await.iter().filter(|n| !n.read).count()
    }

    // Receipts

    pub async fn insert_receipt(&self, receipt: Receipt) {
        self.receipts.write().await.push(receipt);
    }

    pub async fn receipts(&self, transaction_id: Option<&str>) -> Vec<Receipt> {
        self.receipts
            .read()
            .await
            .iter()
            .filter(|r| transaction_id.map_or(true, |id| r.transaction_id == id))
            .cloned()
            .collect()
    }

    pub async fn receipt(&self, id: &str) -> Result<Receipt> {
        self.receipts
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortalError::not_found(format!("receipt {}", id)))
    }

    pub async fn set_receipt_verified(&self, id: &str, verified: bool) -> Result<Receipt> {
        let mut receipts = self.receipts.write().await;
        let receipt = receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PortalError::not_found(format!("receipt {}", id)))?;
        receipt.verified = verified;
        Ok(receipt.clone())
    }

    pub async fn delete_receipt(&self, id: &str) -> Result<Receipt> {
        let mut receipts = self.receipts.write().await;
        let index = receipts
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| PortalError::not_found(format!("receipt {}", id)))?;
        Ok(receipts.remove(index))
    }

    // Payment requests

    pub async fn payment_requests(&self, student_id: Option<&str>) -> Vec<PaymentRequest> {
        self.payment_requests
            .read()
            .await
            .iter()
            .filter(|r| student_id.map_or(true, |id| r.student_id == id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store() {
        let store = PortalStore::seeded().await.unwrap();

        assert_eq!(store.users(&UserFilter::default()).await.len(), 4);
        assert!(store.audit().await.is_empty());

        let tx = store.transaction("tx_001").await.unwrap();
        assert_eq!(tx.confirmations, 12);
        assert_eq!(tx.status, TransactionStatus::Confirmed);

        let requests = store.payment_requests(Some("STU2024001")).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, 7500.0);
    }

    #[tokio::test]
    async fn test_transaction_filters() {
        let store = PortalStore::seeded().await.unwrap();

        let housing = store
            .transactions(&TransactionFilter {
                tx_type: Some(TransactionType::Housing),
                ..TransactionFilter::default()
            })
            .await;
        assert_eq!(housing.len(), 1);
        assert_eq!(housing[0].id, "tx_pending_001");

        let by_search = store
            .transactions(&TransactionFilter {
                search: Some("spring".to_string()),
                ..TransactionFilter::default()
            })
            .await;
        assert_eq!(by_search.len(), 1);
        assert_eq!(by_search[0].id, "tx_001");

        // Newest first
        let all = store.transactions(&TransactionFilter::default()).await;
        assert_eq!(all[0].id, "tx_pending_001");
    }

    #[tokio::test]
    async fn test_user_filters_and_email_uniqueness() {
        let store = PortalStore::seeded().await.unwrap();

        let unverified = store
            .users(&UserFilter {
                verified: Some(false),
                ..UserFilter::default()
            })
            .await;
        assert_eq!(unverified.len(), 1);
        assert_eq!(unverified[0].name, "Emma Davis");

        let admins = store
            .users(&UserFilter {
                role: Some(UserRole::Admin),
                ..UserFilter::default()
            })
            .await;
        assert_eq!(admins.len(), 1);

        let err = store
            .update_user("user_002", |u| u.email = "ALICE.SMITH@university.edu".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict(_)));
        assert_eq!(
            store.user("user_002").await.unwrap().email,
            "bob.wilson@university.edu"
        );
    }

    #[tokio::test]
    async fn test_failed_update_leaves_transaction_untouched() {
        let store = PortalStore::seeded().await.unwrap();
        let err = store
            .update_transaction("tx_001", payment::TransactionLifecycle::mark_failed)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Lifecycle(_)));
        assert_eq!(
            store.transaction("tx_001").await.unwrap().status,
            TransactionStatus::Confirmed
        );

        assert!(matches!(
            store.update_transaction("missing", |_| Ok(())).await,
            Err(PortalError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_notifications() {
        let store = PortalStore::seeded().await.unwrap();
        assert_eq!(store.unread_count().await, 3);

        let errors = store
            .notifications(&NotificationFilter {
                kind: Some(NotificationType::Error),
                ..NotificationFilter::default()
            })
            .await;
        assert_eq!(errors.len(), 1);

        store.mark_notification_read("notif_001").await.unwrap();
        assert_eq!(store.unread_count().await, 2);
        assert_eq!(store.mark_all_notifications_read().await, 2);
        assert_eq!(store.unread_count().await, 0);

        store.delete_notification("notif_004").await.unwrap();
        assert!(store.delete_notification("notif_004").await.is_err());
    }
}
