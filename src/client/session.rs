use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::error::ClientError;
use crate::models::users::{LoginResponse, Role, UserProfile};

/// The logged-in user and the bearer token the server issued for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl From<LoginResponse> for Session {
    fn from(login: LoginResponse) -> Self {
        Session {
            token: login.token,
            user: login.user,
            expires_at: login.expires_at,
        }
    }
}

/// Shared session handle. Clones see the same session; with a file attached the
/// session survives restarts.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads a previously saved session from `path`. A missing, unreadable or
    /// expired file starts logged out.
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let session = std::fs::read(&path)
            .ok()
            .and_then(|bytes| match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    None
                }
            })
            .filter(|session| !session.is_expired(Utc::now()));

        Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(path),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.token.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().map(Session::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn set(&self, session: Session) -> Result<(), ClientError> {
        if let Some(path) = &self.path {
            std::fs::write(path, serde_json::to_vec(&session)?)?;
        }
        *self.write() = Some(session);
        Ok(())
    }

    pub fn clear(&self) {
        *self.write() = None;
        if let Some(path) = &self.path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove session file {:?}: {}", path, e);
                }
            }
        }
    }
}
