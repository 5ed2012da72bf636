//! Twitter API v2 command-line helper
//!
//! Reads a tweet, searches recent tweets, lists bookmarks or shows a user's
//! recent tweets, printing one JSON document to stdout. Failures print a JSON
//! `{"error": ...}` object and exit 1. Logs go to stderr.

mod commands;
mod config;
mod error;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use common::EnvFile;
use serde_json::json;
use tracing::{debug, info};
use twitter_client::ApiClient;

use crate::commands::{Context, DEFAULT_MAX_RESULTS, Output};
use crate::config::Config;
use crate::error::{CommandError, to_pretty};

const USAGE: &str = "Usage: twitter-api <read_tweet|search|bookmarks|user_tweets> [args...]";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "twitter-api", version, about = "Query the Twitter API v2 and print JSON")]
struct Cli {
    /// Credential file [default: $TWITTER_ENV_FILE, then ./.env]
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one tweet by id or URL
    #[command(name = "read_tweet")]
    ReadTweet {
        /// Tweet URL or numeric id
        tweet: Option<String>,
    },
    /// Search tweets from the last seven days
    Search {
        #[arg(allow_hyphen_values = true)]
        query: Option<String>,
        /// Page size, clamped to 10..=100
        #[arg(long = "max_results", default_value_t = DEFAULT_MAX_RESULTS, allow_negative_numbers = true)]
        max_results: i64,
    },
    /// List the authenticated user's bookmarks
    Bookmarks {
        #[arg(long = "max_results", default_value_t = DEFAULT_MAX_RESULTS, allow_negative_numbers = true)]
        max_results: i64,
    },
    /// Show a user's profile summary and recent tweets
    #[command(name = "user_tweets")]
    UserTweets {
        /// Handle, with or without the leading @
        username: Option<String>,
        #[arg(long = "max_results", default_value_t = DEFAULT_MAX_RESULTS, allow_negative_numbers = true)]
        max_results: i64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    common::telemetry::init(common::telemetry::DEFAULT_DIRECTIVE);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            debug!(error = %e, "argument parsing failed");
            return Ok(usage_error());
        }
    };
    let Some(command) = cli.command else {
        return Ok(usage_error());
    };

    let env_path = EnvFile::resolve_path(cli.env_file.as_deref());
    let env = EnvFile::load(env_path)
        .context("failed to load credential file")?;
    let config = Config::from_env_file(&env);

    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let ctx = Context {
        api: ApiClient::new(http, config.api_base_url.clone()),
        config,
    };

    match run(&ctx, command).await {
        Ok(output) => {
            println!("{}", to_pretty(&output));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            info!(error = %e, "command failed");
            println!("{}", e.render());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(ctx: &Context, command: Command) -> std::result::Result<Output, CommandError> {
    let output = match command {
        Command::ReadTweet { tweet } => {
            Output::Tweet(commands::read_tweet(ctx, tweet.as_deref()).await?)
        }
        Command::Search { query, max_results } => {
            Output::Search(commands::search(ctx, query.as_deref(), max_results).await?)
        }
        Command::Bookmarks { max_results } => {
            Output::Bookmarks(commands::bookmarks(ctx, max_results).await?)
        }
        Command::UserTweets {
            username,
            max_results,
        } => Output::UserTweets(
            commands::user_tweets(ctx, username.as_deref(), max_results).await?,
        ),
    };
    Ok(output)
}

fn usage_error() -> ExitCode {
    println!("{}", json!({ "error": USAGE }));
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("twitter-api").chain(args.iter().copied()))
    }

    #[test]
    fn parses_max_results_equals_form() {
        let cli = parse(&["search", "rust", "--max_results=20"]).unwrap();
        match cli.command {
            Some(Command::Search { query, max_results }) => {
                assert_eq!(query.as_deref(), Some("rust"));
                assert_eq!(max_results, 20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn max_results_defaults_to_ten() {
        let cli = parse(&["bookmarks"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Bookmarks { max_results: 10 })
        ));
    }

    #[test]
    fn positional_arguments_are_optional_at_parse_time() {
        // Missing arguments are reported by each command as JSON usage errors
        let cli = parse(&["read_tweet"]).unwrap();
        assert!(matches!(cli.command, Some(Command::ReadTweet { tweet: None })));
    }

    #[test]
    fn search_query_may_start_with_hyphen() {
        let cli = parse(&["search", "-is:retweet rust"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Search { query: Some(ref q), .. }) if q == "-is:retweet rust"
        ));
    }

    #[test]
    fn env_file_flag_is_global() {
        let cli = parse(&["user_tweets", "@jack", "--env-file", "/tmp/creds.env"]).unwrap();
        assert_eq!(cli.env_file.as_deref(), Some("/tmp/creds.env"));
    }

    #[test]
    fn unknown_command_fails_to_parse() {
        assert!(parse(&["timeline"]).is_err());
        assert!(parse(&[]).unwrap().command.is_none());
    }
}
