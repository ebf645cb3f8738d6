//! Share targets for composed images.
//!
//! A target reports up front whether it can take file attachments, so a
//! caller can refuse a share request before producing any output.

use crate::errors::{ClientError, ClientResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tokio::{fs, process::Command};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SHARE_TITLE: &str = "Media with QR Code";
pub const SHARE_TEXT: &str = "Sharing image combined with QR code";

/// Staged files older than this are removed on the next share.
pub const STAGED_FILE_TTL: Duration = Duration::from_secs(60 * 60);

/// A file handed to a share target.
#[derive(Debug, Clone)]
pub struct SharedFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Bytes,
    pub title: &'static str,
    pub text: &'static str,
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this target accepts file attachments at all.
    fn can_share_files(&self) -> bool;

    async fn share(&self, file: SharedFile) -> ClientResult<()>;
}

/// The platform has no share capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

#[async_trait]
impl ShareTarget for NoShare {
    fn can_share_files(&self) -> bool {
        false
    }

    async fn share(&self, _file: SharedFile) -> ClientResult<()> {
        Err(ClientError::ShareUnsupported)
    }
}

/// Shares by running an external program with the staged file path as its
/// last argument. Title and text are passed as `VISALIVE_SHARE_TITLE` and
/// `VISALIVE_SHARE_TEXT`.
///
/// Openers such as `xdg-open` return before the viewer reads the file, so a
/// staged file outlives a successful share. Leftovers older than
/// [`STAGED_FILE_TTL`] are pruned each time a share runs.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
    staging_dir: PathBuf,
}

impl CommandShare {
    /// Parse a whitespace-separated command line such as `xdg-open` or
    /// `gio open`.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            staging_dir: std::env::temp_dir().join("visalive-share"),
        })
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }
}

#[async_trait]
impl ShareTarget for CommandShare {
    fn can_share_files(&self) -> bool {
        true
    }

    async fn share(&self, file: SharedFile) -> ClientResult<()> {
        fs::create_dir_all(&self.staging_dir).await?;
        prune_staged(&self.staging_dir, STAGED_FILE_TTL).await;
        let staged = self
            .staging_dir
            .join(format!("{}-{}", Uuid::new_v4(), file.file_name));
        fs::write(&staged, &file.bytes).await?;
        debug!("staged share file at {}", staged.display());

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&staged)
            .env("VISALIVE_SHARE_TITLE", file.title)
            .env("VISALIVE_SHARE_TEXT", file.text)
            .status()
            .await
            .map_err(|err| ClientError::ShareFailed(format!("{}: {}", self.program, err)))?;

        if status.success() {
            info!("shared {} via {}", file.file_name, self.program);
            Ok(())
        } else {
            let _ = fs::remove_file(&staged).await;
            Err(ClientError::ShareFailed(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// Remove staged files last modified more than `ttl` ago. Failures are
/// logged; pruning never blocks a share.
async fn prune_staged(dir: &Path, ttl: Duration) {
    let Some(cutoff) = SystemTime::now().checked_sub(ttl) else {
        return;
    };
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot scan share staging dir {}: {}", dir.display(), err);
            return;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let stale = match entry.metadata().await.and_then(|meta| meta.modified()) {
            Ok(modified) => modified < cutoff,
            Err(_) => false,
        };
        if !stale {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => debug!("pruned staged share file {}", entry.path().display()),
            Err(err) => warn!("cannot prune {}: {}", entry.path().display(), err),
        }
    }
}
