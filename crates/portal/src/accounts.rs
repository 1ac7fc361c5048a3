//! Login, registration and user administration

use crate::app::AppState;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;
use types::utils::is_valid_address;
use types::{Notification, NotificationType, PortalError, Result, User, UserRole};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

/// Account created by an administrator
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Partial edit of an account; unset fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub student_id: Option<String>,
    pub wallet_address: Option<String>,
    pub is_verified: Option<bool>,
    pub two_factor_enabled: Option<bool>,
}

impl AppState {
    /// Look the email up exactly; there are no passwords
    pub async fn login(&self, email: &str) -> Result<User> {
        delay(self.config.latency.login_ms).await;

        let user = self
            .store
            .user_by_email(email.trim())
            .await
            .ok_or(PortalError::InvalidCredentials)?;
        self.session.save(&user).await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User logged in");
        Ok(user)
    }

    /// Create an unverified student account and log it in
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        delay(self.config.latency.register_ms).await;

        let name = validate_name(&request.name)?;
        let email = validate_email(&request.email)?;

        let (id, student_id) = self.next_student_ids().await;
        let user = User {
            id,
            email,
            role: UserRole::Student,
            name,
            student_id: Some(student_id),
            wallet_address: None,
            created_at: Utc::now(),
            is_verified: false,
            two_factor_enabled: false,
        };
        self.store.insert_user(user.clone()).await?;
        self.session.save(&user).await?;

        self.store
            .push_notification(
                Notification::new(
                    "New User Registration",
                    format!(
                        "{} has registered as a new student and requires verification.",
                        user.name
                    ),
                    NotificationType::Info,
                )
                .for_user(&user.id, &user.name),
            )
            .await;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        if let Some(user) = self.session.current().await {
            info!(user_id = %user.id, "User logged out");
        }
        self.session.clear().await
    }

    /// `user_<millis>`, bumped until unused
    pub async fn next_user_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("user_{}", millis);
            if self.store.user(&id).await.is_err() {
                return id;
            }
            millis += 1;
        }
    }

    /// `user_<millis>` and `STU<last 6 digits>` from the same counter,
    /// bumped until neither is taken
    async fn next_student_ids(&self) -> (String, String) {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("user_{}", millis);
            let student_id = format!("STU{:06}", millis % 1_000_000);
            if self.store.user(&id).await.is_err()
                && self.store.user_by_student_id(&student_id).await.is_none()
            {
                return (id, student_id);
            }
            millis += 1;
        }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let role = new_user.role.unwrap_or(UserRole::Student);
        if let Some(address) = &new_user.wallet_address {
            validate_wallet(address)?;
        }

        let user = User {
            id: self.next_user_id().await,
            email: validate_email(&new_user.email)?,
            role,
            name: validate_name(&new_user.name)?,
            student_id: match role {
                UserRole::Student => new_user.student_id,
                UserRole::Admin => None,
            },
            wallet_address: new_user.wallet_address,
            created_at: Utc::now(),
            is_verified: new_user.is_verified,
            two_factor_enabled: false,
        };
        self.store.insert_user(user.clone()).await?;

        info!(user_id = %user.id, role = role.as_str(), "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let email = update.email.as_deref().map(validate_email).transpose()?;
        if let Some(address) = &update.wallet_address {
            validate_wallet(address)?;
        }

        let user = self
            .store
            .update_user(id, |user| {
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(email) = email {
                    user.email = email;
                }
                if let Some(role) = update.role {
                    user.role = role;
                }
                if update.student_id.is_some() {
                    user.student_id = update.student_id;
                }
                if update.wallet_address.is_some() {
                    user.wallet_address = update.wallet_address;
                }
                if let Some(verified) = update.is_verified {
                    user.is_verified = verified;
                }
                if let Some(enabled) = update.two_factor_enabled {
                    user.two_factor_enabled = enabled;
                }
            })
            .await?;
        self.session.refresh(&user).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User> {
        let user = self.store.delete_user(id).await?;
        if self
            .session
            .current()
            .await
            .is_some_and(|current| current.id == user.id)
        {
            self.session.clear().await?;
        }
        info!(user_id = %user.id, "User deleted");
        Ok(user)
    }

    pub async fn verify_user(&self, id: &str) -> Result<User> {
        let user = self.store.update_user(id, |user| user.is_verified = true).await?;
        self.session.refresh(&user).await?;
        info!(user_id = %user.id, "User verified");
        Ok(user)
    }

    pub async fn toggle_two_factor(&self, id: &str) -> Result<User> {
        let user = self
            .store
            .update_user(id, |user| user.two_factor_enabled = !user.two_factor_enabled)
            .await?;
        self.session.refresh(&user).await?;
        Ok(user)
    }
}

async fn delay(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortalError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(PortalError::Validation(format!("Invalid email address: {}", email)));
    }
    Ok(email.to_string())
}

fn validate_wallet(address: &str) -> Result<()> {
    if !is_valid_address(address) {
        return Err(PortalError::Validation(format!("Invalid wallet address: {}", address)));
    }
    Ok(())
}
