//! Twitter OAuth 2.0 user-token helper
//!
//! Without arguments, runs the PKCE authorization-code flow: opens the
//! browser, captures the redirect on `http://localhost:3000/callback` and
//! stores the issued tokens in the credential file. `refresh` trades the
//! stored refresh token for a new access token.

mod config;
mod error;
mod flows;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{EnvFile, keys};
use tracing::warn;
use twitter_auth::{AuthorizeOptions, REDIRECT_URI, TokenClient};

use crate::config::Config;
use crate::error::Error;
use crate::flows::Stored;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(
    name = "twitter-oauth2",
    version,
    about = "Obtain or refresh a Twitter OAuth 2.0 user access token"
)]
struct Cli {
    /// Credential file [default: $TWITTER_ENV_FILE, then ./.env]
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Exchange the stored refresh token for a new access token
    Refresh,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    common::telemetry::init(common::telemetry::DEFAULT_DIRECTIVE);
    let cli = Cli::parse();

    let env_path = EnvFile::resolve_path(cli.env_file.as_deref());
    let env = EnvFile::load(env_path).context("failed to load credential file")?;
    let config = Config::from_env_file(&env);

    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let result = match cli.command {
        None => run_full(http, &config, env.path()).await,
        Some(Command::Refresh) => run_refresh(http, &config, env.path()).await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e.report());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_full(http: reqwest::Client, config: &Config, env_path: &Path) -> Result<(), Error> {
    let tokens = TokenClient::new(http, config.client_credentials()?);

    let stored = flows::full_flow(&tokens, &AuthorizeOptions::default(), env_path, open_browser)
        .await?;

    let expires_in = stored.tokens.expires_in;
    println!("\nSuccess!");
    println!("  Scopes: {}", stored.tokens.scope);
    println!("  Expires in: {expires_in}s ({}h)", expires_in / 3600);
    print_saved(&stored, env_path);
    if stored.saved_refresh_token() {
        println!("\n  When token expires, run: twitter-oauth2 refresh");
    }
    Ok(())
}

async fn run_refresh(http: reqwest::Client, config: &Config, env_path: &Path) -> Result<(), Error> {
    let tokens = TokenClient::new(http, config.client_credentials()?);
    if config.refresh_token.is_some() {
        println!("Refreshing token...");
    }

    let stored = flows::refresh_flow(&tokens, config.refresh_token.as_ref(), env_path).await?;

    println!(
        "  Saved new {} (expires in {}h)",
        keys::OAUTH2_USER_TOKEN,
        stored.tokens.expires_in / 3600
    );
    if stored.saved_refresh_token() {
        println!("  Saved new {}", keys::OAUTH2_REFRESH_TOKEN);
    }
    Ok(())
}

/// Print the URL for manual use, then try the system browser.
fn open_browser(url: &str) {
    println!("Opening browser for Twitter authorization...");
    println!("If browser doesn't open, visit:\n{url}\n");
    if let Err(e) = open::that_detached(url) {
        warn!(error = %e, "failed to open browser");
    }
    println!("Waiting for callback on {REDIRECT_URI} ...");
}

fn print_saved(stored: &Stored, env_path: &Path) {
    for key in &stored.saved {
        println!("  Saved {key} to {}", env_path.display());
    }
}
