//! Account endpoints: sign-in, the current user, and the public showcase.

use crate::{
    errors::{ClientError, ClientResult},
    models::{
        user::{ProfileUpdate, User},
        wire::{RawLogin, RawPublicVideo, RawUser},
    },
    services::{
        media_client::{decode_json, ensure_success},
        session::Session,
    },
};
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Clone, Debug)]
pub struct AccountClient {
    http: reqwest::Client,
    auth_base: String,
    public_base: String,
    session: Option<Session>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl AccountClient {
    pub fn new(
        http: reqwest::Client,
        auth_base: impl Into<String>,
        public_base: impl Into<String>,
        session: Option<Session>,
    ) -> Self {
        Self {
            http,
            auth_base: auth_base.into().trim_end_matches('/').to_string(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    fn bearer(&self) -> ClientResult<String> {
        self.session
            .as_ref()
            .map(Session::bearer)
            .ok_or_else(|| ClientError::Auth("no session token; sign in first".into()))
    }

    /// Exchange credentials for a session token. The caller decides whether
    /// to persist it.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let url = format!("{}/auth/login", self.auth_base);
        let response = self
            .http
            .post(&url)
            .json(&Credentials { email, password })
            .send()
            .await?;
        let response = ensure_success(response, "login", |status| ClientError::Status {
            operation: "login",
            status: status.as_u16(),
        })?;
        let raw: RawLogin = decode_json(response, "login").await?;
        info!("signed in as {}", email);
        Ok(Session::new(raw.auth_token))
    }

    /// `GET /auth/me`
    #[instrument(skip(self))]
    pub async fn me(&self) -> ClientResult<User> {
        let url = format!("{}/auth/me", self.auth_base);
        debug!("fetching current user from {}", url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .send()
            .await?;
        let response = ensure_success(response, "fetch user", |status| ClientError::Status {
            operation: "fetch user",
            status: status.as_u16(),
        })?;
        let raw: RawUser = decode_json(response, "fetch user").await?;
        Ok(raw.into())
    }

    /// `PATCH /auth/me`
    #[instrument(skip(self, update))]
    pub async fn update_me(&self, update: &ProfileUpdate) -> ClientResult<User> {
        let url = format!("{}/auth/me", self.auth_base);
        let response = self
            .http
            .patch(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .json(update)
            .send()
            .await?;
        let response = ensure_success(response, "update user", |status| ClientError::Status {
            operation: "update user",
            status: status.as_u16(),
        })?;
        let raw: RawUser = decode_json(response, "update user").await?;
        info!("profile updated");
        Ok(raw.into())
    }

    /// URL of the public showcase video, if the backend has one. No session
    /// needed.
    #[instrument(skip(self))]
    pub async fn public_video(&self) -> ClientResult<Option<String>> {
        let url = format!("{}/publicurl", self.public_base);
        let response = self.http.get(&url).send().await?;
        let response = ensure_success(response, "public video", |status| ClientError::Status {
            operation: "public video",
            status: status.as_u16(),
        })?;
        let raw: RawPublicVideo = decode_json(response, "public video").await?;
        Ok(raw.into_url())
    }
}
