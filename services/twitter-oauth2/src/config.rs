//! Client credentials and stored refresh token for `twitter-oauth2`

use common::{EnvFile, Secret, keys};
use twitter_auth::ClientCredentials;

use crate::error::Error;

#[derive(Debug)]
pub struct Config {
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
}

impl Config {
    pub fn from_env_file(env: &EnvFile) -> Self {
        Self::from_lookup(|key| env.var(key))
    }

    /// `TWITTER_CLIENT_ID`/`TWITTER_CLIENT_SECRET`, each falling back to the
    /// OAuth 1.0a consumer key/secret when unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            client_id: lookup(keys::CLIENT_ID).or_else(|| lookup(keys::CONSUMER_KEY)),
            client_secret: lookup(keys::CLIENT_SECRET)
                .or_else(|| lookup(keys::CONSUMER_SECRET))
                .map(Secret::from),
            refresh_token: lookup(keys::OAUTH2_REFRESH_TOKEN).map(Secret::from),
        }
    }

    pub fn client_credentials(&self) -> Result<ClientCredentials, Error> {
        match (&self.client_id, &self.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => Err(Error::MissingClientCredentials),
        }
    }
}
