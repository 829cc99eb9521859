use super::context::UserRecord;
use crate::types::{Result, STORAGE_TOKEN_KEY, STORAGE_USER_KEY};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persists the user record and token under fixed key names, one file per key
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, user: &UserRecord, token: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let user_json = serde_json::to_string(user)?;
        tokio::fs::write(self.dir.join(STORAGE_USER_KEY), user_json).await?;
        tokio::fs::write(self.dir.join(STORAGE_TOKEN_KEY), token).await?;
        tracing::debug!("Saved session for {} to {}", user.email, self.dir.display());
        Ok(())
    }

    /// Loads a persisted session. Absence of either key means no session.
    pub async fn load(&self) -> Result<Option<(UserRecord, String)>> {
        let Some(user_json) = self.read_key(STORAGE_USER_KEY).await? else {
            return Ok(None);
        };
        let Some(token) = self.read_key(STORAGE_TOKEN_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<UserRecord>(&user_json) {
            Ok(user) => Ok(Some((user, token))),
            Err(e) => {
                tracing::warn!("Discarding unreadable persisted user record: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        for key in [STORAGE_USER_KEY, STORAGE_TOKEN_KEY] {
            match tokio::fs::remove_file(self.dir.join(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn read_key(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.dir.join(key)).await {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> SessionStore {
    SessionStore::new(std::env::temp_dir().join(format!("swachhgrid-{}", uuid::Uuid::new_v4())))
}
