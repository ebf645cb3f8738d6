use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

const DEFAULT_MEDIA_BASE: &str = "https://x73t-i3sy-hy16.n7e.xano.io/api:EkZ0h1wI";
const DEFAULT_AUTH_BASE: &str = "https://x73t-i3sy-hy16.n7e.xano.io/api:qgU3RyVM";
const DEFAULT_PUBLIC_BASE: &str = "https://x73t-i3sy-hy16.n7e.xano.io/api:iYpTp_60";

/// Base URLs of the three backend API groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Media collection, uploads and `/my`.
    pub media_base: String,
    /// `/auth/*`.
    pub auth_base: String,
    /// Unauthenticated showcase content.
    pub public_base: String,
}

impl Endpoints {
    pub fn new(
        media_base: impl Into<String>,
        auth_base: impl Into<String>,
        public_base: impl Into<String>,
    ) -> Self {
        Self {
            media_base: trim_base(media_base.into()),
            auth_base: trim_base(auth_base.into()),
            public_base: trim_base(public_base.into()),
        }
    }

    /// All three groups served from one origin (used by tests and local mocks).
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self::new(base.clone(), base.clone(), base)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoints: Endpoints,
    /// File holding the bearer token between invocations.
    pub token_file: PathBuf,
    /// Directory composite downloads are written to.
    pub output_dir: PathBuf,
    /// Optional logo image drawn onto composites.
    pub logo: Option<PathBuf>,
    /// External program used as the share target, if any.
    pub share_command: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Upload, catalogue and share AR media with QR codes")]
pub struct Args {
    /// Media API base URL (overrides VISALIVE_MEDIA_BASE)
    #[arg(long, global = true)]
    pub media_base: Option<String>,

    /// Auth API base URL (overrides VISALIVE_AUTH_BASE)
    #[arg(long, global = true)]
    pub auth_base: Option<String>,

    /// Public API base URL (overrides VISALIVE_PUBLIC_BASE)
    #[arg(long, global = true)]
    pub public_base: Option<String>,

    /// Where the session token is kept (overrides VISALIVE_TOKEN_FILE)
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Directory for downloaded composites (overrides VISALIVE_OUTPUT_DIR)
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Logo image drawn on composites (overrides VISALIVE_LOGO)
    #[arg(long, global = true)]
    pub logo: Option<PathBuf>,

    /// Program invoked to share a composite (overrides VISALIVE_SHARE_COMMAND)
    #[arg(long, global = true)]
    pub share_command: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in with email/password, or store an existing token
    Login {
        #[arg(long, conflicts_with_all = ["email", "password"])]
        token: Option<String>,
        #[arg(long, requires = "password")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Update profile fields; unspecified fields keep their current value
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        subscription: Option<String>,
    },
    /// List your media, newest first
    List {
        /// Only show the N most recent records
        #[arg(long)]
        limit: Option<usize>,
        /// Only show the dashboard's recent-uploads strip
        #[arg(long, conflicts_with = "limit")]
        recent: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one record
    Show { id: String },
    /// Upload files and save them as one record
    Upload {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        video: Option<PathBuf>,
    },
    /// Submit every row of a JSON draft manifest, in order
    Submit { manifest: PathBuf },
    /// Rename a record and/or replace its files
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        video: Option<PathBuf>,
    },
    /// Delete records
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Compose an image with its QR code into one PNG
    Compose {
        /// Record to compose; its image and deep link are used
        id: Option<String>,
        /// Local path or URL of the source image (overrides the record's)
        #[arg(long)]
        source: Option<String>,
        /// QR payload (defaults to the record's deep link)
        #[arg(long)]
        payload: Option<String>,
        /// Hand the PNG to the share command instead of downloading it
        #[arg(long)]
        share: bool,
        /// Also print the PNG as a data URL
        #[arg(long)]
        data_url: bool,
    },
    /// Print the public showcase video URL
    PublicVideo,
    /// Print avatar initials and colour
    Avatar {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        // Parse CLI once
        let args = Args::parse();
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Merge parsed args over values from `lookup` (normally the environment).
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<(Self, Command)> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Environment fallback ---
        let env_media = var("VISALIVE_MEDIA_BASE").unwrap_or_else(|| DEFAULT_MEDIA_BASE.into());
        let env_auth = var("VISALIVE_AUTH_BASE").unwrap_or_else(|| DEFAULT_AUTH_BASE.into());
        let env_public = var("VISALIVE_PUBLIC_BASE").unwrap_or_else(|| DEFAULT_PUBLIC_BASE.into());
        let env_token = var("VISALIVE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/session/auth_token"));
        let env_output = var("VISALIVE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/downloads"));

        // --- Merge ---
        let cfg = Self {
            endpoints: Endpoints::new(
                args.media_base.unwrap_or(env_media),
                args.auth_base.unwrap_or(env_auth),
                args.public_base.unwrap_or(env_public),
            ),
            token_file: args.token_file.unwrap_or(env_token),
            output_dir: args.output_dir.unwrap_or(env_output),
            logo: args.logo.or_else(|| var("VISALIVE_LOGO").map(PathBuf::from)),
            share_command: args.share_command.or_else(|| var("VISALIVE_SHARE_COMMAND")),
        };

        for base in [
            &cfg.endpoints.media_base,
            &cfg.endpoints.auth_base,
            &cfg.endpoints.public_base,
        ] {
            validate_base(base).with_context(|| format!("invalid base URL `{}`", base))?;
        }

        Ok((cfg, args.command))
    }
}

fn validate_base(base: &str) -> Result<()> {
    if base.starts_with("https://") || base.starts_with("http://") {
        Ok(())
    } else {
        anyhow::bail!("expected an http(s) URL")
    }
}
