//! Logged-in user cache
//!
//! The current user is kept in memory and mirrored to
//! `<data_dir>/auth_user.json` so a restarted portal resumes the session.

use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use types::{PortalError, Result, User};

pub const SESSION_KEY: &str = "auth_user";

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<User>>,
}

impl SessionStore {
    /// Open the session under `data_dir`, creating the directory if needed
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| io_error("create session directory", e))?;

        let path = data_dir.join(format!("{}.json", SESSION_KEY));
        let current = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<User>(&bytes) {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "Restored session");
                    Some(user)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error("read session", e)),
        };

        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    pub async fn current(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    pub async fn save(&self, user: &User) -> Result<()> {
        let json = serde_json::to_vec_pretty(user)
            .map_err(|e| PortalError::Internal(format!("Failed to serialize session: {}", e)))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| io_error("write session", e))?;
        *self.current.write().await = Some(user.clone());
        Ok(())
    }

    /// Refresh the cached user if `user` is the one logged in
    pub async fn refresh(&self, user: &User) -> Result<()> {
        let logged_in = self
            .current
            .read()
            .await
            .as_ref()
            .is_some_and(|current| current.id == user.id);
        if logged_in {
            self.save(user).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove session", e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, e: std::io::Error) -> PortalError {
    PortalError::Internal(format!("Failed to {}: {}", action, e))
}
