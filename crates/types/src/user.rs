//! Users, notifications, receipts and wallet connections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Portal role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

/// A portal account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// A receipt stored on the mock IPFS
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub transaction_id: String,
    pub ipfs_hash: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub verified: bool,
}

/// Result of a simulated wallet connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletConnection {
    pub address: String,
    /// Balance in ETH
    pub balance: f64,
    pub network: String,
    pub connected: bool,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Case-insensitive match on name and email, substring match on student id
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let lowered = term.to_lowercase();
        self.name.to_lowercase().contains(&lowered)
            || self.email.to_lowercase().contains(&lowered)
            || self
                .student_id
                .as_deref()
                .is_some_and(|id| id.contains(term))
    }
}

impl Notification {
    /// Create an unread notification
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationType,
    ) -> Self {
        Self {
            id: format!("notif_{}", uuid::Uuid::new_v4().simple()),
            title: title.into(),
            message: message.into(),
            kind,
            read: false,
            created_at: Utc::now(),
            user_id: None,
            user_name: None,
        }
    }

    /// Address the notification to a user
    pub fn for_user(mut self, user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_name = Some(user_name.into());
        self
    }

    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let lowered = term.to_lowercase();
        self.title.to_lowercase().contains(&lowered)
            || self.message.to_lowercase().contains(&lowered)
            || self
                .user_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&lowered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_shape() {
        let user = User {
            id: "user_001".to_string(),
            email: "alice.smith@university.edu".to_string(),
            role: UserRole::Student,
            name: "Alice Smith".to_string(),
            student_id: Some("STU2024001".to_string()),
            wallet_address: None,
            created_at: Utc::now(),
            is_verified: true,
            two_factor_enabled: true,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "student");
        assert_eq!(json["studentId"], "STU2024001");
        assert_eq!(json["twoFactorEnabled"], true);
        assert!(json.get("walletAddress").is_none());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_notification_builder() {
        let n = Notification::new("Payment Confirmed", "done", NotificationType::Success)
            .for_user("user_001", "Alice Smith");
        assert!(!n.read);
        assert!(n.id.starts_with("notif_"));
        assert!(n.matches_search("alice"));
        assert!(n.matches_search("CONFIRMED"));
        assert!(!n.matches_search("failed"));
    }
}
