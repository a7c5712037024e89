//! Per-user credential store keyed by Telegram user id, persisted as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use gbp_google::GoogleCredentials;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Minutes a `/connect` stays valid while waiting for `/code`.
pub const PENDING_AUTH_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential store at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_auth_since: Option<DateTime<Utc>>,
}

impl UserCredentials {
    fn is_empty(&self) -> bool {
        self.google.is_none() && self.pending_auth_since.is_none()
    }
}

/// Whether an authorization started at `since` can still be completed at `now`.
#[must_use]
pub fn auth_window_open(since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(since) <= TimeDelta::minutes(PENDING_AUTH_TTL_MINUTES)
}

/// Shared between all update handlers. Every mutation is written to disk
/// while the write lock is held and only becomes visible once the write
/// succeeded, so memory and file agree.
pub struct CredentialStore {
    path: Option<PathBuf>,
    users: RwLock<HashMap<i64, UserCredentials>>,
}

impl CredentialStore {
    /// Opens the store at `path`; a missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users: HashMap<i64, UserCredentials> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::info!(path = %path.display(), users = users.len(), "credential store loaded");

        Ok(Self {
            path: Some(path),
            users: RwLock::new(users),
        })
    }

    /// A store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, user_id: i64) -> Option<GoogleCredentials> {
        self.users
            .read()
            .await
            .get(&user_id)
            .and_then(|entry| entry.google.clone())
    }

    /// Stores `credentials` for `user_id` and closes any pending authorization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be persisted.
    pub async fn put(
        &self,
        user_id: i64,
        credentials: GoogleCredentials,
    ) -> Result<(), StoreError> {
        self.commit(|users| {
            let entry = users.entry(user_id).or_default();
            entry.google = Some(credentials);
            entry.pending_auth_since = None;
        })
        .await
    }

    /// Forgets everything about `user_id`. Returns whether credentials existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be persisted.
    pub async fn remove(&self, user_id: i64) -> Result<bool, StoreError> {
        self.commit(|users| {
            users
                .remove(&user_id)
                .is_some_and(|entry| entry.google.is_some())
        })
        .await
    }

    /// Records that `user_id` was sent an authorization URL at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be persisted.
    pub async fn begin_auth(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.commit(|users| {
            users.entry(user_id).or_default().pending_auth_since = Some(now);
        })
        .await
    }

    pub async fn pending_since(&self, user_id: i64) -> Option<DateTime<Utc>> {
        self.users
            .read()
            .await
            .get(&user_id)
            .and_then(|entry| entry.pending_auth_since)
    }

    /// Applies `change` to a copy of the map and installs the copy only once
    /// it is on disk. A failed write leaves memory untouched.
    async fn commit<R>(
        &self,
        change: impl FnOnce(&mut HashMap<i64, UserCredentials>) -> R,
    ) -> Result<R, StoreError> {
        let mut users = self.users.write().await;
        let mut next = users.clone();
        let outcome = change(&mut next);
        self.persist(&next).await?;
        *users = next;
        Ok(outcome)
    }

    async fn persist(&self, users: &HashMap<i64, UserCredentials>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let retained: HashMap<&i64, &UserCredentials> =
            users.iter().filter(|(_, entry)| !entry.is_empty()).collect();
        let json = serde_json::to_vec_pretty(&retained).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        write_atomic(path, &json).await
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await.map_err(io_err)?;

    // Refresh tokens live here: owner read/write only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(io_err)?;
    }

    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}
