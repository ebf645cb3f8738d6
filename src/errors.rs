//! Error types shared by every client and workflow in the crate.
//!
//! Library code returns [`ClientResult`]; the binary wraps these in
//! `anyhow::Error` with context and prints them as a one-line status.

use crate::models::media::MediaKind;
use reqwest::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No session is available, or the backend rejected the bearer token.
    #[error("authentication required: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, TLS, connection reset, request build).
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upload {kind} failed with status {status}")]
    Upload { kind: MediaKind, status: u16 },

    #[error("saving media failed with status {status}")]
    Save { status: u16 },

    #[error("sharing files is not supported on this platform")]
    ShareUnsupported,

    #[error("share failed: {0}")]
    ShareFailed(String),

    /// Non-success answer for an operation without a dedicated error kind.
    #[error("{operation} failed with status {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("malformed response for {operation}: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Map an unauthorized/forbidden status to [`ClientError::Auth`].
    pub(crate) fn from_auth_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(Self::Auth(format!(
                "backend rejected the session ({})",
                status.as_u16()
            ))),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_map_to_auth() {
        assert!(
            ClientError::from_auth_status(StatusCode::UNAUTHORIZED)
                .is_some_and(|e| e.is_auth())
        );
        assert!(ClientError::from_auth_status(StatusCode::FORBIDDEN).is_some());
        assert!(ClientError::from_auth_status(StatusCode::NOT_FOUND).is_none());
    }

    #[test]
    fn upload_error_names_the_kind() {
        let err = ClientError::Upload {
            kind: MediaKind::Video,
            status: 500,
        };
        assert_eq!(err.to_string(), "upload video failed with status 500");
    }
}
