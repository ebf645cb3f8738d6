//! Raw response shapes returned by the backend and their normalization.
//!
//! The backend is loose about types: a file reference may be a bare URL
//! string or a file object, ids may be numbers or strings, and timestamps may
//! be epoch milliseconds or RFC 3339 strings. Everything in this module is
//! crate-private; callers only ever see the canonical types from
//! [`crate::models::media`] and [`crate::models::user`].

use crate::models::{
    media::{MediaRecord, MediaRef},
    user::User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, de::IgnoredAny};
use serde_json::{Map, Value};
use tracing::warn;

/// A file reference as found on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawRef {
    Url(String),
    Object(Map<String, Value>),
    Other(IgnoredAny),
}

impl RawRef {
    /// Fold into the canonical reference. Empty URLs and objects without a
    /// `url` normalize to `None`.
    pub(crate) fn normalize(self) -> Option<MediaRef> {
        match self {
            RawRef::Url(url) => {
                let url = url.trim();
                (!url.is_empty()).then(|| MediaRef::from_url(url))
            }
            RawRef::Object(mut fields) => {
                let url = take_string(&mut fields, "url")?;
                if url.is_empty() {
                    return None;
                }
                let size = fields.remove("size").and_then(|v| match v {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                });
                Some(MediaRef {
                    url,
                    path: take_string(&mut fields, "path"),
                    name: take_string(&mut fields, "name"),
                    size,
                    file_type: take_string(&mut fields, "type"),
                    mime: take_string(&mut fields, "mime"),
                    extra: fields,
                })
            }
            RawRef::Other(_) => None,
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            fields.insert(key.to_string(), other);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn normalize(self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl RawTimestamp {
    fn normalize(self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms),
            RawTimestamp::Float(ms) => DateTime::from_timestamp_millis(ms as i64),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    text.trim()
                        .parse::<i64>()
                        .ok()
                        .and_then(DateTime::from_timestamp_millis)
                }),
        }
    }
}

fn normalize_timestamp(raw: Option<RawTimestamp>, id: &str) -> DateTime<Utc> {
    match raw.and_then(RawTimestamp::normalize) {
        Some(ts) => ts,
        None => {
            warn!("record {} has no usable created_at; treating as epoch", id);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// A media row as returned by `/my` and `/media1/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMedia {
    id: RawId,
    #[serde(default)]
    created_at: Option<RawTimestamp>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Image", default)]
    image: Option<RawRef>,
    #[serde(default)]
    video: Option<RawRef>,
}

impl From<RawMedia> for MediaRecord {
    fn from(raw: RawMedia) -> Self {
        let id = raw.id.normalize();
        let created_at = normalize_timestamp(raw.created_at, &id);
        MediaRecord {
            created_at,
            name: raw.name.unwrap_or_default(),
            image: raw.image.and_then(RawRef::normalize),
            video: raw.video.and_then(RawRef::normalize),
            id,
        }
    }
}

/// The current user as returned by `/auth/me`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    subscription_type: Option<String>,
    #[serde(default)]
    profile_picture: Option<RawRef>,
    #[serde(default)]
    created_at: Option<RawTimestamp>,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        User {
            id: raw.id.map(RawId::normalize).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            bio: raw.bio,
            address: raw.address,
            subscription_type: raw.subscription_type,
            profile_picture: raw.profile_picture.and_then(RawRef::normalize),
            created_at: raw.created_at.and_then(RawTimestamp::normalize),
        }
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLogin {
    #[serde(rename = "authToken")]
    pub(crate) auth_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawShowcase {
    #[serde(default)]
    video: Option<RawRef>,
}

/// Response of `GET /publicurl`: either a list of rows or a single row.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPublicVideo {
    List(Vec<RawShowcase>),
    Single(RawShowcase),
}

impl RawPublicVideo {
    pub(crate) fn into_url(self) -> Option<String> {
        let row = match self {
            RawPublicVideo::List(rows) => rows.into_iter().next()?,
            RawPublicVideo::Single(row) => row,
        };
        row.video.and_then(RawRef::normalize).map(|r| r.url)
    }
}
