//! src/services/media_client.rs
//!
//! MediaClient: reads and writes against the backend's media collection and
//! upload endpoints. Every response is normalized through `models::wire`
//! before it is returned, so callers only see canonical `MediaRecord` and
//! `MediaRef` values.
//!
//! Nothing here is transactional: an upload that succeeds followed by a save
//! that fails leaves the stored file orphaned. `services::upload_flow` reports
//! that case explicitly instead of hiding it.

use crate::{
    errors::{ClientError, ClientResult},
    models::{
        media::{MediaKind, MediaPatch, MediaRecord, MediaRef, NewMedia, UploadResult},
        wire::{RawMedia, RawRef},
    },
    services::session::Session,
};
use futures::TryStreamExt;
use reqwest::{
    RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, trace, warn};

/// Multipart field the upload endpoints read the file from.
const UPLOAD_FIELD: &str = "content";

#[derive(Clone, Debug)]
pub struct MediaClient {
    http: reqwest::Client,
    base: String,
    session: Option<Session>,
}

impl MediaClient {
    /// Create a client for the media API group at `base`.
    ///
    /// Without a session only `fetch_record` and `deep_link` are usable; every
    /// other operation fails with [`ClientError::Auth`].
    pub fn new(http: reqwest::Client, base: impl Into<String>, session: Option<Session>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Deep link encoded into QR codes: points at the record-fetch endpoint.
    pub fn deep_link(&self, id: &str) -> String {
        format!("{}/media1/{}", self.base, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ClientError::Auth("no session token; sign in first".into()))?;
        Ok(builder.header(reqwest::header::AUTHORIZATION, session.bearer()))
    }

    /// Fetch every record owned by the current session.
    ///
    /// Ordering is whatever the backend returns; sort through
    /// [`crate::services::gallery::Gallery`] before display.
    #[instrument(skip(self))]
    pub async fn list_mine(&self) -> ClientResult<Vec<MediaRecord>> {
        let url = self.url("my");
        debug!("listing media from {}", url);
        let response = self.authorized(self.http.get(&url))?.send().await?;
        let response = ensure_success(response, "list media", |status| ClientError::Status {
            operation: "list media",
            status: status.as_u16(),
        })?;
        let raw: Vec<RawMedia> = decode_json(response, "list media").await?;
        let records: Vec<MediaRecord> = raw.into_iter().map(MediaRecord::from).collect();
        info!("fetched {} media records", records.len());
        Ok(records)
    }

    /// Fetch a single record by id (the QR deep-link target).
    #[instrument(skip(self))]
    pub async fn fetch_record(&self, id: &str) -> ClientResult<MediaRecord> {
        let mut builder = self.http.get(self.deep_link(id));
        if let Some(session) = &self.session {
            builder = builder.header(reqwest::header::AUTHORIZATION, session.bearer());
        }
        let response = builder.send().await?;
        let response = ensure_success(response, "fetch media", |status| ClientError::Status {
            operation: "fetch media",
            status: status.as_u16(),
        })?;
        let raw: RawMedia = decode_json(response, "fetch media").await?;
        Ok(raw.into())
    }

    /// Stream a local file as a multipart body to the endpoint for `kind`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path, kind: MediaKind) -> ClientResult<UploadResult> {
        let file = File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut sent: u64 = 0;
        let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            trace!("uploaded {}/{} bytes", sent, length);
        });
        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), length)
            .file_name(file_name)
            .mime_str(guess_mime(path))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = self.url(kind.upload_path());
        debug!("uploading {} ({} bytes) to {}", kind, length, url);
        let response = self
            .authorized(self.http.post(&url))?
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response, "upload", |status| ClientError::Upload {
            kind,
            status: status.as_u16(),
        })?;

        let raw: RawRef = decode_json(response, "upload").await?;
        let uploaded = raw.normalize().ok_or_else(|| ClientError::Decode {
            operation: "upload",
            message: "response carries no file url".into(),
        })?;
        info!("uploaded {} to {}", kind, uploaded.url);
        Ok(uploaded)
    }

    /// Create a record. Absent references are omitted from the body.
    #[instrument(skip(self, image, video))]
    pub async fn create_record(
        &self,
        name: &str,
        image: Option<&MediaRef>,
        video: Option<&MediaRef>,
    ) -> ClientResult<MediaRecord> {
        let body = NewMedia { name, image, video };
        let response = self
            .authorized(self.http.post(self.url("media1")))?
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, "save media", |status| ClientError::Save {
            status: status.as_u16(),
        })?;
        let raw: RawMedia = decode_json(response, "save media").await?;
        let record = MediaRecord::from(raw);
        info!("created media record {}", record.id);
        Ok(record)
    }

    /// Change only the fields present in `patch`.
    #[instrument(skip(self, patch))]
    pub async fn update_record(&self, id: &str, patch: &MediaPatch) -> ClientResult<MediaRecord> {
        let response = self
            .authorized(self.http.patch(self.deep_link(id)))?
            .json(patch)
            .send()
            .await?;
        let response = ensure_success(response, "update media", |status| ClientError::Save {
            status: status.as_u16(),
        })?;
        let raw: RawMedia = decode_json(response, "update media").await?;
        info!("updated media record {}", id);
        Ok(raw.into())
    }

    /// Delete a record.
    ///
    /// Idempotent from the caller's view: a missing record counts as done.
    /// Any other error status surfaces as `Status`, as do transport and auth
    /// failures.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, id: &str) -> ClientResult<()> {
        let response = self
            .authorized(self.http.delete(self.deep_link(id)))?
            .send()
            .await?;
        let status = response.status();
        if let Some(err) = ClientError::from_auth_status(status) {
            return Err(err);
        }
        match status {
            s if s.is_success() => info!("deleted media record {}", id),
            StatusCode::NOT_FOUND => debug!("media record {} already gone", id),
            other => {
                warn!("delete of {} answered {}", id, other);
                return Err(ClientError::Status {
                    operation: "delete media",
                    status: other.as_u16(),
                });
            }
        }
        Ok(())
    }
}

/// Reject non-success responses: 401/403 become `Auth`, anything else goes
/// through `on_failure`.
pub(crate) fn ensure_success(
    response: Response,
    operation: &'static str,
    on_failure: impl FnOnce(StatusCode) -> ClientError,
) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!("{} failed with status {}", operation, status);
    Err(ClientError::from_auth_status(status).unwrap_or_else(|| on_failure(status)))
}

/// Read the body and parse it as JSON, keeping transport and parse failures
/// apart.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
        operation,
        message: err.to_string(),
    })
}

/// MIME type sent with an upload, from the file extension.
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}
