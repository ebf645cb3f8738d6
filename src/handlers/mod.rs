//! Command handlers behind the CLI.
//!
//! Each handler takes the shared [`AppState`] plus its arguments and returns
//! the status text printed on success. Library errors are wrapped with
//! `anyhow` context here; nothing below this layer prints.

pub mod account_handlers;
pub mod compose_handlers;
pub mod media_handlers;

use crate::{
    config::{AppConfig, Command},
    services::{
        account::AccountClient,
        gallery::RECENT_COUNT,
        media_client::MediaClient,
        session::{Session, TokenStore},
        share::{CommandShare, NoShare, ShareTarget},
    },
};
use anyhow::{Context, Result};

/// Everything a handler needs, built once per invocation.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub tokens: TokenStore,
    pub session: Option<Session>,
}

impl AppState {
    /// Build the HTTP client and pick up any stored session.
    pub async fn load(config: AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("visalive/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        let tokens = TokenStore::new(&config.token_file);
        let session = tokens
            .load()
            .await
            .with_context(|| format!("reading session from {}", config.token_file.display()))?;
        tracing::debug!("session present: {}", session.is_some());
        Ok(Self {
            config,
            http,
            tokens,
            session,
        })
    }

    pub fn media(&self) -> MediaClient {
        MediaClient::new(
            self.http.clone(),
            &self.config.endpoints.media_base,
            self.session.clone(),
        )
    }

    pub fn account(&self) -> AccountClient {
        AccountClient::new(
            self.http.clone(),
            &self.config.endpoints.auth_base,
            &self.config.endpoints.public_base,
            self.session.clone(),
        )
    }

    /// The configured share command, or a target that refuses everything.
    pub fn share_target(&self) -> Box<dyn ShareTarget> {
        match self.config.share_command.as_deref().and_then(CommandShare::parse) {
            Some(command) => Box::new(command),
            None => Box::new(NoShare),
        }
    }
}

/// Run one CLI command.
pub async fn dispatch(state: &AppState, command: Command) -> Result<String> {
    match command {
        Command::Login {
            token,
            email,
            password,
        } => account_handlers::login(state, token, email, password).await,
        Command::Logout => account_handlers::logout(state).await,
        Command::Whoami => account_handlers::whoami(state).await,
        Command::Profile {
            name,
            email,
            bio,
            address,
            subscription,
        } => {
            let changes = account_handlers::ProfileChanges {
                name,
                email,
                bio,
                address,
                subscription,
            };
            account_handlers::profile(state, changes).await
        }
        Command::PublicVideo => account_handlers::public_video(state).await,
        Command::Avatar { name, email } => {
            Ok(account_handlers::avatar(name.as_deref(), email.as_deref()))
        }
        Command::List {
            limit,
            recent,
            json,
        } => {
            let limit = if recent { Some(RECENT_COUNT) } else { limit };
            media_handlers::list(state, limit, json).await
        }
        Command::Show { id } => media_handlers::show(state, &id).await,
        Command::Upload { name, image, video } => {
            media_handlers::upload(state, &name, image.as_deref(), video.as_deref()).await
        }
        Command::Submit { manifest } => media_handlers::submit(state, &manifest).await,
        Command::Edit {
            id,
            name,
            image,
            video,
        } => media_handlers::edit(state, &id, name, image.as_deref(), video.as_deref()).await,
        Command::Delete { ids } => media_handlers::delete(state, &ids).await,
        Command::Compose {
            id,
            source,
            payload,
            share,
            data_url,
        } => {
            let request = compose_handlers::ComposeRequest {
                id,
                source,
                payload,
                share,
                data_url,
            };
            compose_handlers::compose(state, request).await
        }
    }
}
