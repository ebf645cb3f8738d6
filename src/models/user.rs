//! The signed-in account and its editable profile fields.

use crate::models::media::MediaRef;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The current user as known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub subscription_type: Option<String>,
    pub profile_picture: Option<MediaRef>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn avatar_url(&self) -> Option<&str> {
        self.profile_picture.as_ref().map(|p| p.url.as_str())
    }

    /// Profile form pre-filled with the current values.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            subscription_type: self.subscription_type.clone().unwrap_or_default(),
        }
    }
}

/// Body of `PATCH /auth/me`. The profile form always sends every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub address: String,
    pub subscription_type: String,
}
