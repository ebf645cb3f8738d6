//! Canonical media records and file references.
//!
//! These are the normalized shapes the rest of the crate works with. The
//! backend's loose JSON (bare URL strings vs. file objects, numeric vs. string
//! ids) is folded into these types by [`crate::models::wire`] and never leaks
//! past the repository client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of file being uploaded; selects the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Path segment of the upload endpoint, relative to the media API base.
    pub fn upload_path(self) -> &'static str {
        match self {
            MediaKind::Image => "upload/image",
            MediaKind::Video => "upload/video",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored file as the backend describes it.
///
/// Serializes back into the object form the backend expects when a
/// reference is attached to a create/update call. Backend fields this crate
/// does not model (`access`, `meta`, ...) are kept in `extra` and echoed
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Publicly reachable URL of the stored file.
    pub url: String,

    /// Storage path on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Coarse file type reported by the backend (e.g. `image`, `video`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The backend's acknowledgement of an uploaded file.
pub type UploadResult = MediaRef;

impl MediaRef {
    /// A reference known only by its URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
            name: None,
            size: None,
            file_type: None,
            mime: None,
            extra: Map::new(),
        }
    }
}

/// One uploaded media item after a backend round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<MediaRef>,
    pub video: Option<MediaRef>,
}

impl MediaRecord {
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(|r| r.url.as_str())
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video.as_ref().map(|r| r.url.as_str())
    }

    /// True when the record carries neither an image nor a video.
    pub fn is_placeholder(&self) -> bool {
        self.image.is_none() && self.video.is_none()
    }
}

/// Body of `POST /media1`.
///
/// Absent references are omitted from the JSON, never sent as `null`.
#[derive(Debug, Serialize)]
pub struct NewMedia<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,

    #[serde(rename = "Image", skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a MediaRef>,

    #[serde(rename = "video", skip_serializing_if = "Option::is_none")]
    pub video: Option<&'a MediaRef>,
}

/// Body of `PATCH /media1/{id}`; only supplied fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaPatch {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Image", skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaRef>,

    #[serde(rename = "video", skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaRef>,
}

impl MediaPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none() && self.video.is_none()
    }
}
