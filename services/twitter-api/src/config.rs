//! Credentials and endpoint settings for `twitter-api`

use common::{EnvFile, Secret, keys};
use twitter_auth::OAuth1Credentials;
use twitter_client::{API_BASE_URL, Auth};

use crate::error::CommandError;

/// Resolved settings. Every credential is optional here; each command
/// checks for the ones it needs so a partial `.env` still serves the others.
#[derive(Debug)]
pub struct Config {
    pub api_base_url: String,
    bearer_token: Option<Secret<String>>,
    consumer_key: Option<String>,
    consumer_secret: Option<Secret<String>>,
    access_token: Option<String>,
    access_token_secret: Option<Secret<String>>,
    oauth2_user_token: Option<Secret<String>>,
}

impl Config {
    pub fn from_env_file(env: &EnvFile) -> Self {
        Self::from_lookup(|key| env.var(key))
    }

    /// Build from any key lookup that already treats empty values as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_base_url: lookup(keys::API_BASE_URL).unwrap_or_else(|| API_BASE_URL.to_owned()),
            bearer_token: lookup(keys::BEARER_TOKEN).map(Secret::from),
            consumer_key: lookup(keys::CONSUMER_KEY),
            consumer_secret: lookup(keys::CONSUMER_SECRET).map(Secret::from),
            access_token: lookup(keys::ACCESS_TOKEN),
            access_token_secret: lookup(keys::ACCESS_TOKEN_SECRET).map(Secret::from),
            oauth2_user_token: lookup(keys::OAUTH2_USER_TOKEN).map(Secret::from),
        }
    }

    /// App-only bearer auth for read_tweet, search and user_tweets.
    pub fn bearer(&self) -> Result<Auth, CommandError> {
        self.bearer_token
            .clone()
            .map(Auth::Bearer)
            .ok_or_else(|| CommandError::MissingCredentials(format!("{} not set", keys::BEARER_TOKEN)))
    }

    /// User-context auth for bookmarks.
    ///
    /// OAuth 1.0a when all four keys are present; otherwise an OAuth 2.0 user
    /// token if one was minted. The error names the missing OAuth 1.0a keys.
    pub fn bookmarks_auth(&self) -> Result<Auth, CommandError> {
        match self.oauth1() {
            Ok(credentials) => Ok(Auth::OAuth1(credentials)),
            Err(missing) => match &self.oauth2_user_token {
                Some(token) => Ok(Auth::Bearer(token.clone())),
                None => Err(CommandError::MissingCredentials(format!(
                    "OAuth 1.0a credentials missing: {}. Add them to .env for bookmarks support.",
                    missing.join(", ")
                ))),
            },
        }
    }

    /// All four OAuth 1.0a values, or the names of the absent ones in
    /// declaration order.
    fn oauth1(&self) -> Result<OAuth1Credentials, Vec<&'static str>> {
        match (
            &self.consumer_key,
            &self.consumer_secret,
            &self.access_token,
            &self.access_token_secret,
        ) {
            (Some(ck), Some(cs), Some(at), Some(ats)) => Ok(OAuth1Credentials {
                consumer_key: ck.clone(),
                consumer_secret: cs.clone(),
                token: at.clone(),
                token_secret: ats.clone(),
            }),
            (ck, cs, at, ats) => {
                let present = [ck.is_some(), cs.is_some(), at.is_some(), ats.is_some()];
                let names = [
                    keys::CONSUMER_KEY,
                    keys::CONSUMER_SECRET,
                    keys::ACCESS_TOKEN,
                    keys::ACCESS_TOKEN_SECRET,
                ];
                Err(names
                    .into_iter()
                    .zip(present)
                    .filter_map(|(name, ok)| (!ok).then_some(name))
                    .collect())
            }
        }
    }
}
