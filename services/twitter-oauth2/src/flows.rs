//! Authorization and refresh, each ending with the tokens written back to
//! the credential file

use std::path::Path;

use common::env_file::upsert;
use common::{Secret, keys};
use tracing::info;
use twitter_auth::{AuthorizeOptions, TokenClient, TokenResponse};

use crate::error::Error;

/// Tokens obtained and the credential keys that were written.
#[derive(Debug)]
pub struct Stored {
    pub tokens: TokenResponse,
    pub saved: Vec<&'static str>,
}

impl Stored {
    pub fn saved_refresh_token(&self) -> bool {
        self.saved.contains(&keys::OAUTH2_REFRESH_TOKEN)
    }
}

/// Browser authorization, code exchange, then persistence.
///
/// Nothing is written unless the exchange succeeded.
pub async fn full_flow<F>(
    tokens: &TokenClient,
    options: &AuthorizeOptions,
    env_path: &Path,
    open_browser: F,
) -> Result<Stored, Error>
where
    F: FnOnce(&str),
{
    let issued = twitter_auth::authorize(tokens, options, open_browser)
        .await
        .map_err(Error::from_exchange)?;
    let saved = persist(env_path, &issued).await?;
    Ok(Stored {
        tokens: issued,
        saved,
    })
}

/// Trade the stored refresh token for a new access token.
pub async fn refresh_flow(
    tokens: &TokenClient,
    refresh_token: Option<&Secret<String>>,
    env_path: &Path,
) -> Result<Stored, Error> {
    let refresh_token = refresh_token.ok_or(Error::MissingRefreshToken)?;
    let issued = tokens
        .refresh(refresh_token.as_str())
        .await
        .map_err(Error::from_refresh)?;
    let saved = persist(env_path, &issued).await?;
    Ok(Stored {
        tokens: issued,
        saved,
    })
}

/// Upsert the access token, and the refresh token when one was issued.
async fn persist(env_path: &Path, tokens: &TokenResponse) -> Result<Vec<&'static str>, Error> {
    upsert(env_path, keys::OAUTH2_USER_TOKEN, &tokens.access_token).await?;
    let mut saved = vec![keys::OAUTH2_USER_TOKEN];

    if let Some(refresh) = tokens.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        upsert(env_path, keys::OAUTH2_REFRESH_TOKEN, refresh).await?;
        saved.push(keys::OAUTH2_REFRESH_TOKEN);
    }

    info!(path = %env_path.display(), keys = saved.len(), "tokens stored");
    Ok(saved)
}
