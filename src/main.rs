use anyhow::Result;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use visalive::{
    config::AppConfig,
    handlers::{self, AppState},
};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Logging setup ---
    // stdout carries command output, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(status) => {
            println!("{}", status);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<String> {
    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;
    tracing::debug!("Loaded config: {:?}", cfg);

    // --- Shared state ---
    let state = AppState::load(cfg).await?;

    handlers::dispatch(&state, command).await
}
