//! Session lifecycle: the bearer token injected into every client.
//!
//! A [`Session`] is created at sign-in and destroyed at sign-out; nothing
//! mutates it in between. [`TokenStore`] persists the token in a single file
//! so it survives between CLI invocations.

use crate::errors::ClientResult;
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;
use tracing::{debug, info};

/// An authenticated session. Cheap to clone; read-only once created.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: Arc<str>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// File-backed token persistence.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, if any. A missing or blank file means
    /// "signed out".
    pub async fn load(&self) -> ClientResult<Option<Session>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    debug!("token file {} is empty", self.path.display());
                    Ok(None)
                } else {
                    Ok(Some(Session::new(token)))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist `token` and return the new session.
    pub async fn sign_in(&self, token: impl Into<String>) -> ClientResult<Session> {
        let session = Session::new(token.into().trim());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, session.token()).await?;
        restrict_permissions(&self.path).await?;
        info!("session stored at {}", self.path.display());
        Ok(session)
    }

    /// Drop the persisted session. Returns false if there was none.
    pub async fn sign_out(&self) -> ClientResult<bool> {
        match fs::remove_file(&self.path).await {
            Ok(_) => {
                info!("session cleared");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> ClientResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> ClientResult<()> {
    Ok(())
}
